//! Test fixtures and record generators.

use chrono::{Duration, TimeZone, Utc};
use dashboard_core::{Resource, Role, UserId, UserProfile};
use serde_json::{json, Value};

use crate::mocks::MockSource;

pub const ANALYST_EMAIL: &str = "analyst@soc.io";
pub const ADMIN_EMAIL: &str = "admin@soc.io";
pub const PASSWORD: &str = "correct-horse";
pub const ANALYST_TOKEN: &str = "tok-analyst";
pub const ADMIN_TOKEN: &str = "tok-admin";

pub fn analyst_profile() -> UserProfile {
    UserProfile {
        name: Some("Ana Analyst".to_string()),
        email: Some(ANALYST_EMAIL.to_string()),
        ..UserProfile::new(UserId::Number(7), Role::User)
    }
}

pub fn admin_profile() -> UserProfile {
    UserProfile {
        name: Some("Adam Admin".to_string()),
        email: Some(ADMIN_EMAIL.to_string()),
        ..UserProfile::new(UserId::Number(1), Role::Admin)
    }
}

/// RFC 3339 timestamp `day` days after 2024-03-01.
pub fn day(day: i64) -> String {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).single().unwrap_or_default();
    (base + Duration::days(day)).to_rfc3339()
}

/// SIEM alerts spread over three days, every second one resolved.
pub fn alerts(n: usize) -> Vec<Value> {
    let severities = ["High", "Medium", "Low"];
    (0..n)
        .map(|i| {
            json!({
                "alert_id": i + 1,
                "status": if i % 2 == 0 { "open" } else { "resolved" },
                "severity": severities[i % 3],
                "alert_type": if i % 4 == 0 { "Malware" } else { "Phishing" },
                "detection_source": "IDS",
                "alert_datetime": day((i % 3) as i64),
            })
        })
        .collect()
}

pub fn incidents(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "incident_id": format!("INC-{:03}", i + 1),
                "incident_type": "Intrusion",
                "status": if i % 3 == 0 { "Resolved" } else { "Open" },
                "priority": if i == 0 { "critical" } else { "medium" },
                "created_at": day(i as i64),
            })
        })
        .collect()
}

/// IP analysis rows; every third one has no usable coordinates.
pub fn ip_analysis(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            let (lat, lng) = if i % 3 == 2 {
                (json!("n/a"), json!(null))
            } else {
                (json!(40.0 + i as f64), json!(-70.0 - i as f64))
            };
            json!({
                "ip_address": format!("10.0.0.{}", i + 1),
                "city": "Boston",
                "country": "US",
                "incident_count": i,
                "latitude": lat,
                "longitude": lng,
                "is_blacklisted": i % 2 == 0,
                "is_whitelisted": i % 2 == 1,
            })
        })
        .collect()
}

pub fn notifications(unread: usize, read: usize) -> Vec<Value> {
    (0..unread + read)
        .map(|i| {
            json!({
                "id": i + 1,
                "title": format!("Notice {}", i + 1),
                "message": "Check the console",
                "type": if i % 2 == 0 { "alert" } else { "info" },
                "read": i >= unread,
                "timestamp": day(i as i64),
            })
        })
        .collect()
}

pub fn usb_logs(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "macAddress": format!("00:1B:44:11:3A:{:02}", i),
                "product_key": format!("PK-{}", i),
                "UserName": "jdoe",
                "Total_FileScanned": 10 + i,
                "Total_Virus_Found": i % 2,
                "Detection_Time": day(0),
                "Removal_Time": day(1),
            })
        })
        .collect()
}

pub fn process_logs(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "ProcessName": format!("proc{}.exe", i),
                "CPU": (i * 7 % 50) as f64,
                "Memory": (i * 13 % 80) as f64,
                "MalwareFamily": if i == 0 { json!("Emotet") } else { json!(null) },
            })
        })
        .collect()
}

pub fn users(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "id": i + 1,
                "name": format!("User {:02}", i + 1),
                "email": format!("user{}@soc.io", i + 1),
                "role": if i == 0 { "admin" } else { "user" },
            })
        })
        .collect()
}

/// A source holding a small record set for every resource, plus the analyst
/// and admin accounts.
pub fn populated_source() -> MockSource {
    let source = MockSource::new();
    source.add_account(ANALYST_EMAIL, PASSWORD, ANALYST_TOKEN, analyst_profile());
    source.add_account(ADMIN_EMAIL, PASSWORD, ADMIN_TOKEN, admin_profile());

    source.set_records(Resource::Alerts, alerts(12));
    source.set_records(Resource::Incidents, incidents(4));
    source.set_records(Resource::IpAnalysis, ip_analysis(6));
    source.set_records(Resource::Notifications, notifications(3, 2));
    source.set_records(Resource::UsbLog, usb_logs(25));
    source.set_records(Resource::ProcessLog, process_logs(8));
    source.set_records(Resource::Users, users(15));
    source.set_records(
        Resource::UserActivity,
        vec![
            json!({ "user_id": "7", "activity_type": "login", "country": "US" }),
            json!({ "user_id": "7", "activity_type": "download", "country": "US" }),
            json!({ "user_id": "9", "activity_type": "login", "country": "DE" }),
        ],
    );
    source
}

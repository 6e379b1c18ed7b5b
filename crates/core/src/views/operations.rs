//! Overview, SIEM and SOAR views.

use crate::aggregate::{
    by_date, by_field, by_field_or, by_number, count_where, distinct_count, frequency, mean, ratio,
    time_buckets, valid_coordinates, Aggregation,
};
use crate::binding::{ChartBinding, ChartKind, MapBinding, TableBinding, ViewModel};
use crate::pagination::Paginator;
use crate::record::Record;

use super::{head, Resource, ResourceSet};

const LATEST_ROWS: usize = 10;

const IP_POPUP: &[&str] = &["ip_address", "city", "country", "incident_count"];

/// Counts of every resource on the landing page, in display order.
const OVERVIEW_TOTALS: &[(&str, Resource)] = &[
    ("Total Alerts", Resource::Alerts),
    ("Incidents", Resource::Incidents),
    ("IP Analysis", Resource::IpAnalysis),
    ("EDR Alerts", Resource::EdrAlerts),
    ("EDR Endpoints", Resource::EdrEndpoints),
    ("EDR Analyst Logs", Resource::EdrAnalystLogs),
    ("File Logs", Resource::FileLog),
    ("Network Logs", Resource::NetworkLogs),
    ("Network Alerts XDR", Resource::NetworkAlerts),
    ("Analyst Logs", Resource::AnalystLogs),
    ("Case Timeline SOAR", Resource::CaseTimeline),
    ("Collab Log SOAR", Resource::CollaborationLog),
    ("Response Action SOAR", Resource::ResponseActions),
    ("Threats XDR", Resource::Threats),
    ("TI Feed SOAR", Resource::TiFeed),
    ("User Activity", Resource::UserActivity),
    ("Cloud Alerts XDR", Resource::CloudAlerts),
    ("Endpoints XDR", Resource::XdrEndpoints),
];

/// Landing overview. With `user_id`, user activity is narrowed to that user.
pub(super) fn overview(data: &ResourceSet, user_id: Option<&str>) -> ViewModel {
    let alerts = data.get(Resource::Alerts);
    let activity: Vec<Record> = match user_id {
        Some(id) => data
            .get(Resource::UserActivity)
            .iter()
            .filter(|r| r.text("user_id").as_deref() == Some(id))
            .cloned()
            .collect(),
        None => data.get(Resource::UserActivity).to_vec(),
    };

    let mut model = match user_id {
        Some(id) => ViewModel::new(format!("User {} Overview", id)).stat("User", id),
        None => ViewModel::new("Security Overview"),
    };
    for (label, resource) in OVERVIEW_TOTALS {
        let count = match resource {
            Resource::UserActivity => activity.len(),
            other => data.get(*other).len(),
        };
        model = model.stat(*label, count);
    }

    let located = valid_coordinates(
        data.get(Resource::IpAnalysis),
        by_number("latitude"),
        by_number("longitude"),
    );

    let latest = Paginator::with_size(LATEST_ROWS);

    model
        .chart(ChartBinding::single(
            "alert_status",
            "Alert Status",
            ChartKind::Pie,
            "Alerts",
            &frequency(alerts, by_field("status")),
        ))
        .chart(ChartBinding::single(
            "alerts_over_time",
            "Alerts Over Time",
            ChartKind::Line,
            "Alerts",
            &time_buckets(alerts, by_date("alert_datetime")),
        ))
        .chart(ChartBinding::single(
            "alert_severity",
            "Alert Severity",
            ChartKind::Bar,
            "Alerts",
            &frequency(alerts, by_field("severity")),
        ))
        .chart(ChartBinding::single(
            "edr_endpoint_status",
            "EDR Endpoint Status",
            ChartKind::Doughnut,
            "Endpoints",
            &frequency(data.get(Resource::EdrEndpoints), by_field("status")),
        ))
        .chart(ChartBinding::single(
            "network_alert_types",
            "Network Alert Types",
            ChartKind::Bar,
            "Alerts",
            &frequency(data.get(Resource::NetworkAlerts), by_field("type")),
        ))
        .chart(ChartBinding::single(
            "threat_types",
            "Threat Types",
            ChartKind::Pie,
            "Threats",
            &frequency(data.get(Resource::Threats), by_field("threat_type")),
        ))
        .chart(ChartBinding::single(
            "user_activity_types",
            "User Activity Types",
            ChartKind::Bar,
            "Activities",
            &frequency(&activity, by_field("activity_type")),
        ))
        .map(MapBinding::from_located(
            "ip_map",
            "IP Locations",
            &located,
            IP_POPUP,
        ))
        .table(TableBinding::from_page(
            "latest_incidents",
            "Latest Incidents",
            &["incident_id", "incident_type", "status", "priority"],
            latest.page(head(data.get(Resource::Incidents), LATEST_ROWS)),
        ))
        .table(TableBinding::from_page(
            "latest_edr_alerts",
            "Latest EDR Alerts",
            &["alert_id", "severity", "detected_at", "description"],
            latest.page(head(data.get(Resource::EdrAlerts), LATEST_ROWS)),
        ))
        .table(TableBinding::from_page(
            "latest_file_logs",
            "Latest File Logs",
            &["filename", "isMalicious", "fileSize"],
            latest.page(head(data.get(Resource::FileLog), LATEST_ROWS)),
        ))
        .table(TableBinding::from_page(
            "latest_cloud_alerts",
            "Latest Cloud Alerts",
            &["type", "severity", "status"],
            latest.page(head(data.get(Resource::CloudAlerts), LATEST_ROWS)),
        ))
}

pub(super) fn siem(data: &ResourceSet) -> ViewModel {
    let alerts = data.get(Resource::Alerts);
    let incidents = data.get(Resource::Incidents);
    let ips = data.get(Resource::IpAnalysis);

    let located = valid_coordinates(ips, by_number("latitude"), by_number("longitude"));

    ViewModel::new("SIEM")
        .stat("Total Alerts", alerts.len())
        .stat("Unique Alert Types", distinct_count(alerts, by_field("alert_type")))
        .stat("Total Incidents", incidents.len())
        .stat(
            "Incident Types",
            distinct_count(incidents, by_field("incident_type")),
        )
        .stat("Open Incidents", count_status(incidents, "open"))
        .stat("Resolved Incidents", count_status(incidents, "resolved"))
        .stat(
            "Critical Incidents",
            count_where(incidents, |r| r.text("priority").as_deref() == Some("critical")),
        )
        .stat("Analyzed IPs", ips.len())
        .stat("Blacklisted IPs", count_where(ips, |r| r.flag("is_blacklisted")))
        .stat("Whitelisted IPs", count_where(ips, |r| r.flag("is_whitelisted")))
        .chart(ChartBinding::single(
            "incident_status",
            "Incident Status",
            ChartKind::Pie,
            "Incidents",
            &frequency(incidents, by_field("status")),
        ))
        .chart(ChartBinding::single(
            "incident_priority",
            "Incident Priority",
            ChartKind::Bar,
            "Incidents",
            &frequency(incidents, by_field("priority")),
        ))
        .chart(ChartBinding::single(
            "incident_types",
            "Incident Types",
            ChartKind::Doughnut,
            "Incidents",
            &frequency(incidents, by_field("incident_type")),
        ))
        .chart(ChartBinding::single(
            "alert_status",
            "Alert Status",
            ChartKind::Pie,
            "Alerts",
            &frequency(alerts, by_field("status")),
        ))
        .chart(ChartBinding::single(
            "alerts_over_time",
            "Alerts Over Time",
            ChartKind::Line,
            "Alerts",
            &time_buckets(alerts, by_date("alert_datetime")),
        ))
        .chart(ChartBinding::single(
            "alert_severity",
            "Alert Severity",
            ChartKind::Bar,
            "Alerts",
            &frequency(alerts, by_field("severity")),
        ))
        .chart(ChartBinding::single(
            "detection_source",
            "Detection Source",
            ChartKind::Bar,
            "Alerts",
            &frequency(alerts, by_field("detection_source")),
        ))
        .chart(ChartBinding::single(
            "alert_types",
            "Alert Types",
            ChartKind::Bar,
            "Alerts",
            &frequency(alerts, by_field("alert_type")),
        ))
        .map(MapBinding::from_located(
            "ip_map",
            "IP Analysis",
            &located,
            IP_POPUP,
        ))
}

pub(super) fn soar(data: &ResourceSet) -> ViewModel {
    let alerts = data.get(Resource::Alerts);
    let analyst_logs = data.get(Resource::AnalystLogs);
    let responses = data.get(Resource::ResponseActions);
    let collaboration = data.get(Resource::CollaborationLog);

    let resolved = count_status(alerts, "resolved");
    let unresolved = count_status(alerts, "unresolved");
    let resolution = Aggregation {
        labels: vec!["Resolved".to_string(), "Unresolved".to_string()],
        values: vec![resolved, unresolved],
    };

    // Mean is over all response actions, a missing time counts as zero
    let mean_response = if responses.is_empty() {
        0.0
    } else {
        mean(responses, |r| Some(r.number("response_time").unwrap_or(0.0)))
    };

    let all_rows = Paginator::with_size(collaboration.len());

    ViewModel::new("SOAR")
        .stat("Total Alerts", alerts.len())
        .stat("Resolved", resolved)
        .stat("Unresolved", unresolved)
        .stat("Resolved Percentage", ratio(resolved, alerts.len() as u64))
        .stat("Unique Analysts", distinct_count(analyst_logs, by_field("analyst_id")))
        .stat("Mean Response Time", round2(mean_response))
        .stat("Case Timeline Entries", data.get(Resource::CaseTimeline).len())
        .chart(ChartBinding::single(
            "alert_resolution",
            "Alert Resolution",
            ChartKind::Doughnut,
            "Alerts",
            &resolution,
        ))
        .chart(ChartBinding::single(
            "analyst_actions",
            "Analyst Actions",
            ChartKind::Bar,
            "Actions",
            &frequency(
                analyst_logs,
                by_field_or("action_performed", "Unknown Action"),
            ),
        ))
        .chart(ChartBinding::single(
            "response_actions",
            "Response Actions",
            ChartKind::Pie,
            "Actions",
            &frequency(responses, by_field_or("action_type", "Unknown Type")),
        ))
        .table(TableBinding::from_page(
            "collaboration_log",
            "Collaboration Log",
            &["analyst_id", "comment", "timestamp"],
            all_rows.page(collaboration),
        ))
}

fn count_status(records: &[Record], status: &str) -> u64 {
    count_where(records, |r| r.text("status").as_deref() == Some(status))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Network detection, threat intelligence and user behaviour views.

use crate::aggregate::{
    by_date, by_field, by_number, count_where, distinct_count, frequency, rank, time_buckets,
    top_n, valid_coordinates, Aggregation, UNKNOWN_LABEL,
};
use crate::binding::{ChartBinding, ChartKind, MapBinding, TableBinding, ViewModel};
use crate::record::Record;

use super::{Resource, ResourceSet, ViewParams};

const TOP_COUNTRIES: usize = 10;
const TOP_SOURCES: usize = 10;

/// Anomaly value the sensors report for "no anomaly".
const NO_ANOMALY: &str = "NA";

pub(super) fn ndr(data: &ResourceSet) -> ViewModel {
    let logs = data.get(Resource::NetworkLogs);
    let alerts = data.get(Resource::NetworkAlerts);

    ViewModel::new("NDR")
        .stat("Total Logs", logs.len())
        .stat("Threat Alerts", alerts.len())
        .stat("Unique IPs", distinct_count(logs, by_field("source_ip")))
        .stat("Analyzed IPs", data.get(Resource::IpAnalysis).len())
        .chart(ChartBinding::single(
            "traffic_over_time",
            "Traffic Volume",
            ChartKind::Line,
            "Traffic Volume",
            &time_buckets(logs, by_date("timestamp")),
        ))
        .chart(ChartBinding::single(
            "alert_severity",
            "Alert Severity",
            ChartKind::Pie,
            "Alerts",
            &frequency(alerts, by_field("severity")),
        ))
        .chart(ChartBinding::single(
            "top_source_ips",
            "Top Source IPs",
            ChartKind::Bar,
            "Connection Count",
            &top_n(logs, by_field("source_ip"), TOP_SOURCES),
        ))
        .chart(ChartBinding::single(
            "anomaly_types",
            "Anomaly Types",
            ChartKind::Doughnut,
            "Anomalies",
            &anomalies(logs),
        ))
}

pub(super) fn threat_intel(data: &ResourceSet) -> ViewModel {
    let threats = data.get(Resource::Threats);
    let logs = data.get(Resource::NetworkLogs);
    let feed = data.get(Resource::TiFeed);

    let indicators = frequency(feed, by_field("indicator_type"));
    let countries = rank(
        without(frequency(logs, by_field("country")), &[UNKNOWN_LABEL]),
        TOP_COUNTRIES,
    );
    let located = valid_coordinates(logs, by_number("latitude"), by_number("longitude"));

    ViewModel::new("Threat Intelligence")
        .stat("Total Threats", threats.len())
        .stat(
            "Critical Threats",
            count_where(threats, |r| r.text("severity").as_deref() == Some("Critical")),
        )
        .stat(
            "Open Threats",
            count_where(threats, |r| r.text("status").as_deref() == Some("Open")),
        )
        .stat(
            "High TI Feeds",
            count_where(feed, |r| r.text("threat_level").as_deref() == Some("High")),
        )
        .chart(ChartBinding::single(
            "threat_types",
            "Threat Types",
            ChartKind::Pie,
            "Threats",
            &frequency(threats, by_field("threat_type")),
        ))
        .chart(ChartBinding::multi(
            "anomalies_vs_indicators",
            "Anomalies vs Indicators",
            ChartKind::Bar,
            &[("Anomalies", &anomalies(logs)), ("Indicators", &indicators)],
        ))
        .chart(ChartBinding::single(
            "top_countries",
            "Top Countries",
            ChartKind::Bar,
            "Events",
            &countries,
        ))
        .map(MapBinding::from_located(
            "threat_map",
            "Network Activity",
            &located,
            &["source_ip", "city", "region", "country"],
        ))
}

pub(super) fn ueba(data: &ResourceSet, params: &ViewParams) -> ViewModel {
    let activity = data.get(Resource::UserActivity);
    let located = valid_coordinates(activity, by_number("latitude"), by_number("longitude"));

    ViewModel::new("UEBA")
        .stat("Total Activities", activity.len())
        .stat(
            "Blacklisted IPs",
            count_where(activity, |r| r.flag("is_ip_blacklisted")),
        )
        .stat(
            "Verified Publishers",
            count_where(activity, |r| r.flag("publisher_verified")),
        )
        .chart(ChartBinding::single(
            "top_countries",
            "Top Countries",
            ChartKind::Bar,
            "Activities",
            &top_n(activity, by_field("country"), TOP_COUNTRIES),
        ))
        .map(MapBinding::from_located(
            "activity_map",
            "Activity Locations",
            &located,
            &["ip_address", "city", "region", "country", "new_software_name"],
        ))
        .table(TableBinding::from_page(
            "user_activity",
            "User Activity",
            &[
                "user_id",
                "ip_address",
                "country",
                "new_software_name",
                "is_ip_blacklisted",
                "publisher_verified",
            ],
            params.paginator().page(activity),
        ))
}

/// Anomaly types seen in network logs, without the "no anomaly" marker.
fn anomalies(logs: &[Record]) -> Aggregation {
    without(
        frequency(logs, by_field("anomaly_type")),
        &[UNKNOWN_LABEL, NO_ANOMALY],
    )
}

fn without(aggregation: Aggregation, excluded: &[&str]) -> Aggregation {
    let (labels, values) = aggregation
        .iter()
        .filter(|(label, _)| !excluded.contains(label))
        .map(|(label, count)| (label.to_string(), count))
        .unzip();
    Aggregation { labels, values }
}

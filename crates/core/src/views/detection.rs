//! Extended and endpoint detection views.

use crate::aggregate::{by_date, by_field, by_field_or, distinct_count, frequency, time_buckets, top_n};
use crate::binding::{ChartBinding, ChartKind, TableBinding, ViewModel};
use crate::pagination::Paginator;

use super::{head, Resource, ResourceSet};

const TOP_TECHNIQUES: usize = 10;
const RECENT_ALERTS: usize = 10;

pub(super) fn xdr(data: &ResourceSet) -> ViewModel {
    let cloud = data.get(Resource::CloudAlerts);
    let network = data.get(Resource::NetworkAlerts);
    let threats = data.get(Resource::Threats);
    let endpoints = data.get(Resource::XdrEndpoints);

    ViewModel::new("XDR")
        .stat("Cloud Alerts", cloud.len())
        .stat("Network Alerts", network.len())
        .stat("Threats", threats.len())
        .stat("Endpoints", endpoints.len())
        .chart(ChartBinding::single(
            "cloud_severity",
            "Cloud Alert Severity",
            ChartKind::Pie,
            "Alerts",
            &frequency(cloud, by_field("severity")),
        ))
        .chart(ChartBinding::single(
            "cloud_types",
            "Cloud Alert Types",
            ChartKind::Bar,
            "Alerts",
            &frequency(cloud, by_field("alert_type")),
        ))
        .chart(ChartBinding::single(
            "network_alerts_over_time",
            "Network Alerts Over Time",
            ChartKind::Line,
            "Alerts",
            &time_buckets(network, by_date("detected_at")),
        ))
        .chart(ChartBinding::single(
            "threat_types",
            "Threat Types",
            ChartKind::Doughnut,
            "Threats",
            &frequency(threats, by_field("threat_type")),
        ))
        .chart(ChartBinding::single(
            "threat_status",
            "Threat Status",
            ChartKind::Pie,
            "Threats",
            &frequency(threats, by_field("status")),
        ))
        .chart(ChartBinding::single(
            "endpoint_os",
            "Endpoint OS",
            ChartKind::Bar,
            "Endpoints",
            &frequency(endpoints, by_field("os_type")),
        ))
        .chart(ChartBinding::single(
            "mitre_techniques",
            "Top MITRE Techniques",
            ChartKind::Bar,
            "Occurrences",
            &top_n(
                data.get(Resource::TiFeed),
                by_field("technique_name"),
                TOP_TECHNIQUES,
            ),
        ))
        .table(TableBinding::from_page(
            "recent_cloud_alerts",
            "Recent Cloud Alerts",
            &["alert_type", "severity", "detected_at"],
            Paginator::with_size(RECENT_ALERTS).page(head(cloud, RECENT_ALERTS)),
        ))
}

pub(super) fn edr(data: &ResourceSet) -> ViewModel {
    let alerts = data.get(Resource::EdrAlerts);
    let endpoints = data.get(Resource::EdrEndpoints);
    let analyst_logs = data.get(Resource::EdrAnalystLogs);

    ViewModel::new("EDR")
        .stat("Alerts", alerts.len())
        .stat("Endpoints", endpoints.len())
        .stat("Analysts", distinct_count(analyst_logs, by_field("analyst_name")))
        .chart(ChartBinding::single(
            "alert_severity",
            "Alert Severity",
            ChartKind::Pie,
            "Alerts",
            &frequency(alerts, by_field("severity")),
        ))
        .chart(ChartBinding::single(
            "alerts_over_time",
            "Alerts Over Time",
            ChartKind::Line,
            "Alerts",
            &time_buckets(alerts, by_date("detected_at")),
        ))
        .chart(ChartBinding::single(
            "endpoint_os",
            "Endpoint OS",
            ChartKind::Doughnut,
            "Endpoints",
            &frequency(endpoints, by_field("os_type")),
        ))
        .chart(ChartBinding::single(
            "analyst_actions",
            "Analyst Actions",
            ChartKind::Bar,
            "Actions",
            &frequency(analyst_logs, by_field_or("action_type", "Reviewed")),
        ))
        .table(TableBinding::from_page(
            "recent_alerts",
            "Recent Alerts",
            &["alert_id", "severity", "detected_at", "description"],
            Paginator::with_size(RECENT_ALERTS).page(head(alerts, RECENT_ALERTS)),
        ))
}

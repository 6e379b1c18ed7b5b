//! Host telemetry views: ML file scans, process performance and USB scans.

use crate::aggregate::{by_number, count_where, ratio, sum, Aggregation};
use crate::binding::{ChartBinding, ChartKind, TableBinding, ViewModel};
use crate::record::Record;

use super::{head, sort_records, Resource, ResourceSet, SortOrder, ViewParams};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const TOP_PROCESSES: usize = 5;
const USB_CHART_ROWS: usize = 10;

/// Process columns that can drive the performance ranking.
const PROCESS_SORT_KEYS: [&str; 2] = ["CPU", "Memory"];

pub(super) fn file_scan(data: &ResourceSet, params: &ViewParams) -> ViewModel {
    let scanned: Vec<Record> = data
        .get(Resource::FileLog)
        .iter()
        .filter(|r| r.number("MLScan") == Some(1.0))
        .cloned()
        .collect();

    let malicious = count_where(&scanned, |r| r.number("isMalicious") == Some(1.0));
    let clean = count_where(&scanned, |r| r.number("isMalicious") == Some(0.0));
    let total_mb = round2(sum(&scanned, by_number("fileSize")) / BYTES_PER_MB);

    let verdicts = Aggregation {
        labels: vec!["Malicious".to_string(), "Non-Malicious".to_string()],
        values: vec![malicious, clean],
    };

    ViewModel::new("ML File Scan")
        .stat("Scanned Files", scanned.len())
        .stat("Malicious", malicious)
        .stat("Non-Malicious", clean)
        .stat("Malicious Percentage", ratio(malicious, scanned.len() as u64))
        .stat("Total Size (MB)", total_mb)
        .chart(ChartBinding::single(
            "scan_verdicts",
            "Scan Verdicts",
            ChartKind::Pie,
            "Files",
            &verdicts,
        ))
        .table(TableBinding::from_page(
            "scanned_files",
            "Scanned Files",
            &["filename", "isMalicious", "fileSize", "detection_time"],
            params.paginator().page(&scanned),
        ))
}

/// Process table filtered by `search` on the process name and ranked
/// descending by `sort` (`CPU` unless `Memory` is requested).
pub(super) fn pc_performance(data: &ResourceSet, params: &ViewParams) -> ViewModel {
    let logs = data.get(Resource::ProcessLog);

    let key = params
        .sort
        .as_deref()
        .and_then(|s| PROCESS_SORT_KEYS.iter().find(|k| k.eq_ignore_ascii_case(s)))
        .copied()
        .unwrap_or(PROCESS_SORT_KEYS[0]);

    let needle = params.needle();
    let mut ranked: Vec<Record> = logs
        .iter()
        .filter(|r| match &needle {
            Some(n) => r
                .text("ProcessName")
                .is_some_and(|name| name.to_lowercase().contains(n.as_str())),
            None => true,
        })
        .cloned()
        .collect();
    sort_records(&mut ranked, key, SortOrder::Desc);

    let top = head(&ranked, TOP_PROCESSES);
    let labels: Vec<String> = top
        .iter()
        .map(|r| r.text("ProcessName").unwrap_or_else(|| "N/A".to_string()))
        .collect();
    let series: Vec<(String, Vec<f64>)> = PROCESS_SORT_KEYS
        .iter()
        .map(|field| {
            let values: Vec<f64> = top
                .iter()
                .map(|r| round2(r.number(field).unwrap_or(0.0)))
                .collect();
            (field.to_string(), values)
        })
        .collect();

    ViewModel::new("PC Performance")
        .stat("Processes", logs.len())
        .stat("Total CPU", round2(sum(logs, by_number("CPU"))))
        .stat("Total Memory", round2(sum(logs, by_number("Memory"))))
        .stat(
            "Infected Processes",
            count_where(logs, |r| r.text("MalwareFamily").is_some()),
        )
        .chart(ChartBinding::numeric(
            "top_processes",
            "Top Processes",
            ChartKind::Bar,
            labels,
            series,
        ))
        .table(TableBinding::from_page(
            "processes",
            "Processes",
            &[
                "ProcessName",
                "processID",
                "UserName",
                "CPU",
                "Memory",
                "MalwareFamily",
                "VirusType",
                "isSigned",
                "DateTimeP",
            ],
            params.paginator().page(&ranked),
        ))
}

pub(super) fn usb_log(data: &ResourceSet, params: &ViewParams) -> ViewModel {
    let logs = data.get(Resource::UsbLog);
    let charted = head(logs, USB_CHART_ROWS);

    let labels: Vec<String> = charted
        .iter()
        .map(|r| r.text("macAddress").unwrap_or_else(|| "N/A".to_string()))
        .collect();
    let series: Vec<(String, Vec<f64>)> = [
        ("Files Scanned", "Total_FileScanned"),
        ("Virus Found", "Total_Virus_Found"),
    ]
    .iter()
    .map(|(name, field)| {
        let values: Vec<f64> = charted
            .iter()
            .map(|r| r.number(field).unwrap_or(0.0))
            .collect();
        (name.to_string(), values)
    })
    .collect();

    ViewModel::new("USB Scan Log")
        .stat("Total Logs", logs.len())
        .stat("Files Scanned", sum(logs, by_number("Total_FileScanned")))
        .stat("Viruses Found", sum(logs, by_number("Total_Virus_Found")))
        .chart(ChartBinding::numeric(
            "scan_summary",
            "Scan Summary",
            ChartKind::Bar,
            labels,
            series,
        ))
        .table(TableBinding::from_page(
            "usb_logs",
            "USB Logs",
            &[
                "macAddress",
                "product_key",
                "UserName",
                "Total_FileScanned",
                "Total_Virus_Found",
                "Detection_Time",
                "Removal_Time",
            ],
            params.paginator().page(logs),
        ))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! View binding: aggregation results shaped for the presentation widgets.
//!
//! Charts get an ordered label array and one or more aligned datasets,
//! tables get a page of rows, maps get markers. Colours come from a fixed
//! palette indexed by label position so they stay stable across renders.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::{Aggregation, Located};
use crate::pagination::{Page, PageInfo};
use crate::record::Record;

/// Fixed chart palette.
pub const PALETTE: [&str; 10] = [
    "#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6", "#ec4899", "#14b8a6", "#f97316",
    "#6366f1", "#84cc16",
];

/// Colour for the label at `index`.
pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Chart widget type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Doughnut,
}

/// One series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub colors: Vec<String>,
}

/// Everything a chart widget needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBinding {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartBinding {
    /// Single-series chart. Each label gets its palette colour.
    pub fn single(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: ChartKind,
        series_label: impl Into<String>,
        aggregation: &Aggregation,
    ) -> Self {
        let colors = (0..aggregation.len())
            .map(|i| palette_color(i).to_string())
            .collect();
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            labels: aggregation.labels.clone(),
            datasets: vec![Dataset {
                label: series_label.into(),
                data: aggregation.values.iter().map(|&v| v as f64).collect(),
                colors,
            }],
        }
    }

    /// Multi-series chart over the union of labels, see [`align`].
    ///
    /// Each series takes the palette colour of its position.
    pub fn multi(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: ChartKind,
        series: &[(&str, &Aggregation)],
    ) -> Self {
        let aggregations: Vec<&Aggregation> = series.iter().map(|(_, agg)| *agg).collect();
        let (labels, columns) = align(&aggregations);
        let datasets = series
            .iter()
            .zip(columns)
            .enumerate()
            .map(|(i, ((name, _), values))| Dataset {
                label: (*name).to_string(),
                colors: vec![palette_color(i).to_string(); values.len()],
                data: values.into_iter().map(|v| v as f64).collect(),
            })
            .collect();
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            labels,
            datasets,
        }
    }

    /// Chart with explicit labels and numeric datasets, one palette colour per
    /// dataset.
    pub fn numeric(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: ChartKind,
        labels: Vec<String>,
        series: Vec<(String, Vec<f64>)>,
    ) -> Self {
        let datasets = series
            .into_iter()
            .enumerate()
            .map(|(i, (label, data))| Dataset {
                label,
                colors: vec![palette_color(i).to_string(); data.len()],
                data,
            })
            .collect();
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            labels,
            datasets,
        }
    }
}

/// Aligns several aggregations onto the union of their labels.
///
/// Labels keep first-seen order across the inputs; a series with no count
/// for a label gets `0` there.
pub fn align(series: &[&Aggregation]) -> (Vec<String>, Vec<Vec<u64>>) {
    let mut labels: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for agg in series {
        for label in &agg.labels {
            if seen.insert(label.as_str()) {
                labels.push(label.clone());
            }
        }
    }

    let columns = series
        .iter()
        .map(|agg| labels.iter().map(|l| agg.value_of(l)).collect())
        .collect();
    (labels, columns)
}

/// Headline number shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub label: String,
    pub value: Value,
}

impl Stat {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A page of table rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBinding {
    pub id: String,
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    pub page: PageInfo,
}

impl TableBinding {
    pub fn from_page(
        id: impl Into<String>,
        title: impl Into<String>,
        columns: &[&str],
        page: Page<'_, Record>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: page.items.to_vec(),
            page: page.info,
        }
    }
}

/// A map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    pub popup: Vec<(String, String)>,
}

/// Everything a map widget needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapBinding {
    pub id: String,
    pub title: String,
    pub markers: Vec<Marker>,
}

impl MapBinding {
    /// Builds markers from coordinate-filtered records. `popup_fields` are
    /// copied as text, `"N/A"` when missing.
    pub fn from_located(
        id: impl Into<String>,
        title: impl Into<String>,
        located: &[Located<'_>],
        popup_fields: &[&str],
    ) -> Self {
        let markers = located
            .iter()
            .map(|loc| Marker {
                lat: loc.lat,
                lng: loc.lng,
                popup: popup_fields
                    .iter()
                    .map(|f| {
                        (
                            f.to_string(),
                            loc.record.text(f).unwrap_or_else(|| "N/A".to_string()),
                        )
                    })
                    .collect(),
            })
            .collect();
        Self {
            id: id.into(),
            title: title.into(),
            markers,
        }
    }
}

/// The bound model of one view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub title: String,
    pub stats: Vec<Stat>,
    pub charts: Vec<ChartBinding>,
    pub tables: Vec<TableBinding>,
    pub maps: Vec<MapBinding>,
}

impl ViewModel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn stat(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.stats.push(Stat::new(label, value));
        self
    }

    pub fn chart(mut self, chart: ChartBinding) -> Self {
        self.charts.push(chart);
        self
    }

    pub fn table(mut self, table: TableBinding) -> Self {
        self.tables.push(table);
        self
    }

    pub fn map(mut self, map: MapBinding) -> Self {
        self.maps.push(map);
        self
    }

    pub fn find_chart(&self, id: &str) -> Option<&ChartBinding> {
        self.charts.iter().find(|c| c.id == id)
    }

    pub fn find_table(&self, id: &str) -> Option<&TableBinding> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn find_stat(&self, label: &str) -> Option<&Value> {
        self.stats.iter().find(|s| s.label == label).map(|s| &s.value)
    }
}

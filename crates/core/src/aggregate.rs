//! Aggregation engine.
//!
//! Pure functions that fold raw records into labelled counts and summary
//! scalars. Nothing here allocates shared state or performs I/O.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Label for records whose grouping key is missing or malformed.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Labelled counts with positional correspondence between `labels` and
/// `values`. Labels are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl Aggregation {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }

    /// Count for a label, `0` if absent.
    pub fn value_of(&self, label: &str) -> u64 {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.values[i])
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Order-preserving counter keyed by label.
#[derive(Default)]
struct Tally {
    index: HashMap<String, usize>,
    out: Aggregation,
}

impl Tally {
    fn add(&mut self, label: String) {
        match self.index.get(&label) {
            Some(&i) => self.out.values[i] += 1,
            None => {
                self.index.insert(label.clone(), self.out.labels.len());
                self.out.labels.push(label);
                self.out.values.push(1);
            }
        }
    }

    fn finish(self) -> Aggregation {
        self.out
    }
}

/// Groups records by `key_fn` and counts each group.
///
/// Labels appear in first-seen order. Records for which `key_fn` returns
/// `None` are counted under [`UNKNOWN_LABEL`].
pub fn frequency<F>(records: &[Record], key_fn: F) -> Aggregation
where
    F: Fn(&Record) -> Option<String>,
{
    let mut tally = Tally::default();
    for record in records {
        tally.add(key_fn(record).unwrap_or_else(|| UNKNOWN_LABEL.to_string()));
    }
    tally.finish()
}

/// Counts records per calendar date, labels sorted chronologically.
///
/// Labels are ISO dates (`YYYY-MM-DD`). Undated records are counted under a
/// trailing [`UNKNOWN_LABEL`] bucket.
pub fn time_buckets<F>(records: &[Record], date_fn: F) -> Aggregation
where
    F: Fn(&Record) -> Option<NaiveDate>,
{
    let mut by_date: HashMap<NaiveDate, u64> = HashMap::new();
    let mut undated = 0u64;
    for record in records {
        match date_fn(record) {
            Some(date) => *by_date.entry(date).or_insert(0) += 1,
            None => undated += 1,
        }
    }

    let mut dates: Vec<(NaiveDate, u64)> = by_date.into_iter().collect();
    dates.sort_unstable_by_key(|(date, _)| *date);

    let mut out = Aggregation {
        labels: dates
            .iter()
            .map(|(date, _)| date.format("%Y-%m-%d").to_string())
            .collect(),
        values: dates.iter().map(|(_, count)| *count).collect(),
    };
    if undated > 0 {
        out.labels.push(UNKNOWN_LABEL.to_string());
        out.values.push(undated);
    }
    out
}

/// The `n` most frequent groups, descending by count.
///
/// Ties keep first-seen order.
pub fn top_n<F>(records: &[Record], key_fn: F, n: usize) -> Aggregation
where
    F: Fn(&Record) -> Option<String>,
{
    rank(frequency(records, key_fn), n)
}

/// Sorts an aggregation descending by count (stable) and keeps `n` entries.
pub fn rank(aggregation: Aggregation, n: usize) -> Aggregation {
    let mut pairs: Vec<(String, u64)> = aggregation
        .labels
        .into_iter()
        .zip(aggregation.values)
        .collect();
    // sort_by is stable, so equal counts keep first-seen order
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    pairs.truncate(n);

    let (labels, values) = pairs.into_iter().unzip();
    Aggregation { labels, values }
}

/// Percentage of `numerator` over `denominator`, rounded to the nearest
/// integer. A zero denominator yields `0`.
pub fn ratio(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    (100.0 * numerator as f64 / denominator as f64).round() as u64
}

/// A record paired with its parsed coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located<'a> {
    pub record: &'a Record,
    pub lat: f64,
    pub lng: f64,
}

/// Keeps records whose latitude and longitude both parse to finite numbers.
pub fn valid_coordinates<'a, Lat, Lng>(
    records: &'a [Record],
    lat_fn: Lat,
    lng_fn: Lng,
) -> Vec<Located<'a>>
where
    Lat: Fn(&Record) -> Option<f64>,
    Lng: Fn(&Record) -> Option<f64>,
{
    records
        .iter()
        .filter_map(|record| {
            let lat = lat_fn(record).filter(|v| v.is_finite())?;
            let lng = lng_fn(record).filter(|v| v.is_finite())?;
            Some(Located { record, lat, lng })
        })
        .collect()
}

/// Sum of a numeric projection; unparseable values are skipped.
pub fn sum<F>(records: &[Record], value_fn: F) -> f64
where
    F: Fn(&Record) -> Option<f64>,
{
    records.iter().filter_map(value_fn).sum()
}

/// Mean of a numeric projection over the records that have it; `0.0` when
/// none do.
pub fn mean<F>(records: &[Record], value_fn: F) -> f64
where
    F: Fn(&Record) -> Option<f64>,
{
    let values: Vec<f64> = records.iter().filter_map(value_fn).collect();
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Number of distinct keys. Missing keys count as one [`UNKNOWN_LABEL`] key.
pub fn distinct_count<F>(records: &[Record], key_fn: F) -> usize
where
    F: Fn(&Record) -> Option<String>,
{
    records
        .iter()
        .map(|r| key_fn(r).unwrap_or_else(|| UNKNOWN_LABEL.to_string()))
        .collect::<HashSet<_>>()
        .len()
}

/// Number of records matching a predicate.
pub fn count_where<F>(records: &[Record], predicate: F) -> u64
where
    F: Fn(&Record) -> bool,
{
    records.iter().filter(|r| predicate(r)).count() as u64
}

/// Key function reading a text field.
pub fn by_field(key: &'static str) -> impl Fn(&Record) -> Option<String> {
    move |r| r.text(key)
}

/// Key function reading a text field, falling back to `default` when absent.
pub fn by_field_or(key: &'static str, default: &'static str) -> impl Fn(&Record) -> Option<String> {
    move |r| Some(r.text(key).unwrap_or_else(|| default.to_string()))
}

/// Date function reading a timestamp field.
pub fn by_date(key: &'static str) -> impl Fn(&Record) -> Option<NaiveDate> {
    move |r| r.date(key)
}

/// Numeric projection reading a field.
pub fn by_number(key: &'static str) -> impl Fn(&Record) -> Option<f64> {
    move |r| r.number(key)
}

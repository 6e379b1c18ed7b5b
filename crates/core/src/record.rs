//! Raw API records.
//!
//! The remote API defines the shape of every record; the dashboard treats
//! them as untyped key-value bags and only parses the fields it aggregates
//! on. Accessors never fail: a missing or malformed field reads as `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Datetime layouts accepted in addition to RFC 3339.
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// One row returned by the remote API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Raw field access.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Field as display text. Null, missing and blank strings read as `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Field as a finite number. Numeric strings are parsed; anything else
    /// (including `NaN` and infinities) reads as `None`.
    pub fn number(&self, key: &str) -> Option<f64> {
        let n = match self.0.get(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Field as a boolean flag. The API encodes flags as `1`, `"1"`,
    /// `true` or `"true"`.
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64() == Some(1.0),
            Some(Value::String(s)) => matches!(s.trim(), "1" | "true" | "TRUE" | "True"),
            _ => false,
        }
    }

    /// Field as a UTC timestamp.
    ///
    /// Accepts RFC 3339, naive `YYYY-MM-DD[ T]HH:MM:SS[.f]` (read as UTC),
    /// bare `YYYY-MM-DD` (midnight UTC) and epoch milliseconds.
    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.0.get(key)? {
            Value::String(s) => parse_timestamp(s.trim()),
            Value::Number(n) => Utc.timestamp_millis_opt(n.as_i64()?).single(),
            _ => None,
        }
    }

    /// Calendar date (UTC) of a timestamp field.
    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        self.timestamp(key).map(|ts| ts.date_naive())
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for Record {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

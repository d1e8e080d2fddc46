//! Readings and the raw upstream series they are derived from.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// A single observation: an instant and a numeric value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// When the value was observed.
    pub time: DateTime<Utc>,
    /// Observed value.
    pub value: f64,
}

impl Reading {
    /// Create a reading.
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

/// A history entry of a normalized sensor.
///
/// Keeps the canonical instant next to the label rendered for display, so
/// consumers never have to parse the label back.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayReading {
    pub time: DateTime<Utc>,
    pub value: f64,
    /// Human-readable rendering of `time` in the display zone.
    pub label: String,
}

impl DisplayReading {
    /// The canonical reading behind this entry.
    pub fn reading(&self) -> Reading {
        Reading::new(self.time, self.value)
    }
}

/// Time of a raw reading as upstream sends it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RawTime {
    /// ISO 8601 text, with or without an offset.
    Text(String),
    /// Milliseconds since the Unix epoch.
    Millis(i64),
    /// Milliseconds since the Unix epoch, sent with a fractional part.
    FractionalMillis(f64),
}

impl From<&str> for RawTime {
    fn from(s: &str) -> Self {
        RawTime::Text(s.to_string())
    }
}

impl From<i64> for RawTime {
    fn from(ms: i64) -> Self {
        RawTime::Millis(ms)
    }
}

impl From<f64> for RawTime {
    fn from(ms: f64) -> Self {
        RawTime::FractionalMillis(ms)
    }
}

/// One entry of an upstream history array.
///
/// `value` is `None` when upstream sent `null` or left it out.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawReading {
    pub time: RawTime,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: Option<f64>,
}

impl RawReading {
    pub fn new(time: impl Into<RawTime>, value: f64) -> Self {
        Self {
            time: time.into(),
            value: Some(value),
        }
    }

    /// An entry whose value is missing.
    pub fn blank(time: impl Into<RawTime>) -> Self {
        Self {
            time: time.into(),
            value: None,
        }
    }
}

/// A sensor series as received from upstream.
///
/// Both fields may be missing. Fields this model does not know about
/// (`status`, `value`, ...) are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawSeries {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub unit: Option<String>,

    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub history: Option<Vec<RawReading>>,
}

impl RawSeries {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the declared unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Append a raw reading to the history.
    pub fn reading(mut self, time: impl Into<RawTime>, value: f64) -> Self {
        self.history
            .get_or_insert_with(Vec::new)
            .push(RawReading::new(time, value));
        self
    }

    /// Number of raw history entries.
    pub fn len(&self) -> usize {
        self.history.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Upstream payload keyed by sensor (or file section) key.
pub type RawPayload = BTreeMap<String, RawSeries>;

//! Normalization of upstream series into [`NormalizedSensor`] records.
//!
//! Upstream addresses the same sensor in two ways: directly by sensor key
//! (`soilTemperature`) or by a key nested inside a file-level section
//! (`temperature` inside `soil`). The caller passes both keys in a
//! [`SensorAddress`]; the nested key wins whenever it is present.

use chrono::FixedOffset;
use fieldwatch_types::{DisplayReading, NormalizedSensor, RawPayload, RawSeries};

use super::time::{display_label, parse_instant};
use crate::error::{Error, Result};

/// Which key a series was found under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressScheme {
    /// Found under the primary (direct) key.
    Direct,
    /// Found under the alternate (nested file) key.
    NestedFile,
}

/// Keys a sensor may be found under in a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorAddress {
    primary: String,
    alternate: Option<String>,
}

impl SensorAddress {
    /// Address a sensor by its direct key only.
    pub fn new(primary: impl Into<String>) -> Result<Self> {
        Ok(Self {
            primary: validate_key(primary.into())?,
            alternate: None,
        })
    }

    /// Address a sensor by its direct key with a nested file key taking priority.
    pub fn with_alternate(primary: impl Into<String>, alternate: impl Into<String>) -> Result<Self> {
        Ok(Self {
            primary: validate_key(primary.into())?,
            alternate: Some(validate_key(alternate.into())?),
        })
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn alternate(&self) -> Option<&str> {
        self.alternate.as_deref()
    }

    /// Find the series this address refers to.
    pub fn resolve<'a>(&self, raw: &'a RawPayload) -> Option<(AddressScheme, &'a RawSeries)> {
        self.alternate
            .as_ref()
            .and_then(|key| raw.get(key))
            .map(|series| (AddressScheme::NestedFile, series))
            .or_else(|| {
                raw.get(&self.primary)
                    .map(|series| (AddressScheme::Direct, series))
            })
    }
}

fn validate_key(key: String) -> Result<String> {
    if key.trim().is_empty() {
        return Err(Error::invalid_identifier("payload key", key));
    }
    Ok(key)
}

/// Outcome of a normalization pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// A series was found under the given key and applied.
    Updated(NormalizedSensor, AddressScheme),
    /// No series was found; the previous record is returned as-is.
    Unchanged(NormalizedSensor),
}

impl Normalized {
    pub fn is_updated(&self) -> bool {
        matches!(self, Normalized::Updated(..))
    }

    /// Key the applied series was found under.
    pub fn scheme(&self) -> Option<AddressScheme> {
        match self {
            Normalized::Updated(_, scheme) => Some(*scheme),
            Normalized::Unchanged(_) => None,
        }
    }

    pub fn sensor(&self) -> &NormalizedSensor {
        match self {
            Normalized::Updated(sensor, _) | Normalized::Unchanged(sensor) => sensor,
        }
    }

    pub fn into_inner(self) -> NormalizedSensor {
        match self {
            Normalized::Updated(sensor, _) | Normalized::Unchanged(sensor) => sensor,
        }
    }
}

/// Apply the series `address` points at in `raw` to `previous`.
///
/// - History times are parsed into instants and labelled in `zone`; entries
///   whose time cannot be parsed or whose value is missing are dropped.
/// - History is sorted ascending by instant (stable for equal instants).
/// - `value` becomes the last history value, or 0 with no history.
/// - A declared unit replaces the previous one; otherwise it is kept.
/// - Thresholds, status and trend are carried over untouched.
pub fn normalize(
    previous: NormalizedSensor,
    raw: &RawPayload,
    address: &SensorAddress,
    zone: FixedOffset,
) -> Normalized {
    let Some((scheme, series)) = address.resolve(raw) else {
        tracing::debug!(key = address.primary(), "No series for sensor, keeping previous record");
        return Normalized::Unchanged(previous);
    };

    let mut history: Vec<DisplayReading> = series
        .history
        .iter()
        .flatten()
        .filter_map(|entry| {
            let Some(value) = entry.value else {
                tracing::warn!(
                    key = address.primary(),
                    time = ?entry.time,
                    "Dropping reading without a value"
                );
                return None;
            };
            match parse_instant(&entry.time, zone) {
                Some(time) => Some(DisplayReading {
                    time,
                    value,
                    label: display_label(time, zone),
                }),
                None => {
                    tracing::warn!(
                        key = address.primary(),
                        time = ?entry.time,
                        "Dropping reading with unparseable time"
                    );
                    None
                }
            }
        })
        .collect();

    if !history.windows(2).all(|pair| pair[0].time <= pair[1].time) {
        tracing::debug!(key = address.primary(), "Upstream history out of order, sorting");
        history.sort_by_key(|entry| entry.time);
    }

    let mut sensor = previous;
    sensor.value = history.last().map_or(0.0, |entry| entry.value);
    sensor.history = history;
    if let Some(unit) = &series.unit {
        sensor.unit = unit.clone();
    }

    tracing::trace!(
        key = address.primary(),
        scheme = ?scheme,
        readings = sensor.history.len(),
        "Sensor normalized"
    );
    Normalized::Updated(sensor, scheme)
}

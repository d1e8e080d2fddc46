//! The normalized per-sensor record and its thresholds.

use crate::{DisplayReading, Reading, Status, Trend};

/// Absolute and optimal bands for a sensor.
///
/// The expected contract is `min <= optimal_min <= optimal_max <= max`, but
/// it is not enforced; classification treats whatever values it is given
/// literally.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Thresholds {
    pub min: f64,
    pub max: f64,
    pub optimal_min: f64,
    pub optimal_max: f64,
}

impl Thresholds {
    pub const fn new(min: f64, max: f64, optimal_min: f64, optimal_max: f64) -> Self {
        Self {
            min,
            max,
            optimal_min,
            optimal_max,
        }
    }

    /// Whether the bands are ordered as expected.
    pub fn is_ordered(&self) -> bool {
        self.min <= self.optimal_min
            && self.optimal_min <= self.optimal_max
            && self.optimal_max <= self.max
    }
}

/// Canonical per-sensor record.
///
/// `history` is ascending by time, and `value` mirrors the last history
/// entry (0 when there is none).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizedSensor {
    pub value: f64,
    pub unit: String,
    pub history: Vec<DisplayReading>,
    pub min: f64,
    pub max: f64,
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub status: Status,
    pub trend: Trend,
}

impl NormalizedSensor {
    /// A fresh record with no history, an `unknown` status and a `stable` trend.
    pub fn new(unit: impl Into<String>, thresholds: Thresholds) -> Self {
        Self {
            unit: unit.into(),
            min: thresholds.min,
            max: thresholds.max,
            optimal_min: thresholds.optimal_min,
            optimal_max: thresholds.optimal_max,
            ..Default::default()
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.min, self.max, self.optimal_min, self.optimal_max)
    }

    /// Canonical readings of the history, oldest first.
    pub fn readings(&self) -> Vec<Reading> {
        self.history.iter().map(DisplayReading::reading).collect()
    }

    /// The most recent history entry, if any.
    pub fn latest(&self) -> Option<&DisplayReading> {
        self.history.last()
    }

    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn new_sensor_defaults() {
        let sensor = NormalizedSensor::new("pH", Thresholds::new(0.0, 14.0, 6.0, 7.5));
        assert_eq!(sensor.unit, "pH");
        assert_eq!(sensor.value, 0.0);
        assert!(!sensor.has_history());
        assert_eq!(sensor.status, Status::Unknown);
        assert_eq!(sensor.trend, Trend::Stable);
        assert_eq!(sensor.optimal_max, 7.5);
    }

    #[test]
    fn default_thresholds_are_zero() {
        let t = Thresholds::default();
        assert_eq!(t, Thresholds::new(0.0, 0.0, 0.0, 0.0));
        assert!(t.is_ordered());
    }

    #[test]
    fn unordered_thresholds_detected() {
        assert!(!Thresholds::new(0.0, 10.0, 8.0, 4.0).is_ordered());
        assert!(Thresholds::new(0.0, 10.0, 4.0, 6.0).is_ordered());
    }

    #[test]
    fn readings_follow_history() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2025, 1, 1, 1, 0, 0).unwrap();
        let mut sensor = NormalizedSensor::default();
        sensor.history = vec![
            DisplayReading {
                time: t0,
                value: 1.0,
                label: String::new(),
            },
            DisplayReading {
                time: t1,
                value: 2.0,
                label: String::new(),
            },
        ];

        assert_eq!(
            sensor.readings(),
            vec![Reading::new(t0, 1.0), Reading::new(t1, 2.0)]
        );
        assert_eq!(sensor.latest().map(|r| r.value), Some(2.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn thresholds_missing_fields_default_to_zero() {
        let t: Thresholds = serde_json::from_str(r#"{ "max": 40 }"#).unwrap();
        assert_eq!(t, Thresholds::new(0.0, 40.0, 0.0, 0.0));
    }
}

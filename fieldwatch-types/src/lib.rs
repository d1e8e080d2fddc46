//! # fieldwatch-types
//!
//! Core types for sensor telemetry. This crate defines the data model shared
//! by the fieldwatch normalizer, classifier and exporters: raw upstream
//! series as they arrive, canonical readings, and the normalized per-sensor
//! record with its classifications.
//!
//! ## Design Goals
//!
//! - **Small surface**: Plain data types with no processing logic
//! - **Optional serialization**: Enable the `serde` feature to read upstream payloads
//! - **Canonical instants**: Every reading carries a UTC instant; display strings are derived
//!
//! ## Features
//!
//! - `serde`: JSON (and other format) serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use fieldwatch_types::{NormalizedSensor, Status, Thresholds, Trend};
//!
//! let thresholds = Thresholds::new(0.0, 50.0, 18.0, 28.0);
//! let sensor = NormalizedSensor::new("°C", thresholds);
//!
//! assert_eq!(sensor.value, 0.0);
//! assert_eq!(sensor.status, Status::Unknown);
//! assert_eq!(sensor.trend, Trend::Stable);
//! assert_eq!(sensor.thresholds(), thresholds);
//! ```

mod reading;
mod sensor;
mod status;

pub use reading::*;
pub use sensor::*;
pub use status::*;

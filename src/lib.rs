//! # fieldwatch
//!
//! A library and CLI for normalizing, classifying and exporting
//! environmental sensor telemetry (soil, air and light sensors).
//!
//! Upstream services report each sensor as a loosely-typed series of
//! timestamped values. This crate turns those payloads into display-ready
//! sensors with threshold-based status, trend and health scores, and exports
//! selected series as CSV or JSON artifacts.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ┌─────────┐    ┌──────────────┐    ┌──────────────────────┐ │
//! │  │ source  │───▶│     data     │───▶│        export        │ │
//! │  │ (input) │    │ normalize +  │    │ align ──▶ csv / json │ │
//! │  └─────────┘    │   classify   │    └──────────┬───────────┘ │
//! │                 └──────▲───────┘               │             │
//! │                        │                       ▼             │
//! │                 ┌──────┴───────┐        ┌────────────┐       │
//! │                 │    config    │        │ ExportSink │       │
//! │                 │ (thresholds) │        └────────────┘       │
//! │                 └──────────────┘                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Where payload documents come from ([`DataSource`] trait,
//!   [`FileSource`]) and the grouped or flat [`PayloadDocument`] shape
//! - **[`data`]**: Time utilities, the response normalizer, the
//!   status/trend/health classifier, and the classified [`SensorBoard`]
//! - **[`export`]**: Union alignment, CSV and JSON rendering, and the
//!   [`Exporter`] that resolves requests into artifacts
//! - **[`config`]**: Layered [`Settings`] with the sensor catalog and thresholds
//! - **[`error`]**: Crate [`Error`] and the staged [`ExportError`]
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Print the classified board for a payload file
//! fieldwatch --file payload.json
//!
//! # Export the last 30 days of two sensors as CSV
//! fieldwatch --file payload.json --export ./out --format csv \
//!     --sensor soil_moisture --sensor air_temperature --timeframe 30d
//! ```
//!
//! ### As a library
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use fieldwatch::{ExportRequest, Exporter, SensorBoard, SensorId, SeriesSet, Settings};
//!
//! let settings = Settings::default();
//! let payload = r#"{
//!     "soil": {
//!         "moisture": {
//!             "unit": "%",
//!             "history": [{ "time": "2025-06-14T01:00:00Z", "value": 55.0 }]
//!         }
//!     }
//! }"#;
//!
//! let board = SensorBoard::parse(payload, &settings).unwrap();
//! let readings = board.readings("soil_moisture").unwrap();
//!
//! let data = SeriesSet::new().with(SensorId::new("soil_moisture").unwrap(), readings);
//! let request = ExportRequest::new("csv").sensor("soil_moisture");
//! let now = Utc.with_ymd_and_hms(2025, 6, 14, 12, 0, 0).unwrap();
//!
//! let artifact = Exporter::new(&settings).export(&request, &data, now).unwrap();
//! assert_eq!(artifact.filename, "sensor_data_2025-06-07_to_2025-06-14.csv");
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod source;

// Re-export main types for convenience
pub use crate::config::{SensorProfile, Settings};
pub use data::{SensorBoard, SensorState, Timeframe};
pub use error::{Error, ExportError, ExportStage, Result};
pub use export::{
    align, DirectorySink, ExportArtifact, ExportFormat, ExportRequest, ExportSink, ExportTable,
    Exporter, SensorId, SeriesSet,
};
pub use fieldwatch_types::{
    GrowthPrediction, NormalizedSensor, RawPayload, RawSeries, Reading, Status, SystemStatus,
    Thresholds, Trend,
};
pub use source::{DataSource, FileSource, PayloadDocument};

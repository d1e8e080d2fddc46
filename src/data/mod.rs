//! Normalization and classification of sensor telemetry.
//!
//! This module turns raw upstream series into display-ready sensors with
//! status, trend and health computed from configured thresholds.
//!
//! ## Submodules
//!
//! - [`time`]: Timestamp parsing, display labels and date-range helpers
//! - [`normalize`]: Converting a [`RawPayload`](fieldwatch_types::RawPayload) entry into a [`NormalizedSensor`](fieldwatch_types::NormalizedSensor)
//! - [`classify`]: Status bands, trend, health scores and system rollups
//! - [`board`]: The classified sensor catalog ([`SensorBoard`], [`SensorState`])
//!
//! ## Data Flow
//!
//! ```text
//! PayloadDocument (raw JSON)
//!        │
//!        ▼
//! SensorBoard::from_document()
//!        │
//!        ├──▶ normalize() per catalog sensor (keeps thresholds)
//!        │
//!        └──▶ classify: status, trend, score ──▶ system status, health
//! ```

pub mod board;
pub mod classify;
pub mod normalize;
pub mod time;

pub use board::{format_value, SensorBoard, SensorState};
pub use classify::{
    classify_status, classify_trend, growth_prediction, overall_health, score_parameter,
    system_status,
};
pub use normalize::{normalize, AddressScheme, Normalized, SensorAddress};
pub use time::{DateRange, Timeframe};

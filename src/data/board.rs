//! Sensor board: every catalog sensor normalized and classified.
//!
//! This module turns an upstream payload document into per-sensor state with
//! status, trend and health computed from the configured thresholds, plus
//! the system-wide rollups shown on a dashboard.

use std::fs;
use std::path::Path;

use fieldwatch_types::{GrowthPrediction, NormalizedSensor, Reading, Status, SystemStatus};

use super::classify::{
    growth_prediction, observed_range, overall_health, score_sensor, system_status,
    update_status, update_trend,
};
use super::normalize::{normalize, AddressScheme, SensorAddress};
use crate::config::{SensorProfile, Settings};
use crate::error::Result;
use crate::source::PayloadDocument;

/// One catalog sensor after normalization and classification.
#[derive(Debug, Clone)]
pub struct SensorState {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sensor: NormalizedSensor,
    /// Health score, present once the sensor has readings.
    pub score: Option<u8>,
    /// Smallest and largest value in the history.
    pub observed: (f64, f64),
    /// Key the series was found under, if any.
    pub scheme: Option<AddressScheme>,
}

impl SensorState {
    pub fn status(&self) -> Status {
        self.sensor.status
    }

    pub fn has_data(&self) -> bool {
        self.sensor.has_history()
    }
}

/// Complete classified board ready for display or export.
#[derive(Debug, Clone)]
pub struct SensorBoard {
    /// Sensors, worst status first, then by id.
    pub sensors: Vec<SensorState>,
    pub system: SystemStatus,
    /// Mean health score over sensors with readings.
    pub health: u8,
    pub prediction: GrowthPrediction,
}

impl SensorBoard {
    /// Load and classify a payload document from a JSON file.
    pub fn load(path: &Path, settings: &Settings) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, settings)
    }

    /// Parse and classify a payload document from a JSON string.
    pub fn parse(content: &str, settings: &Settings) -> Result<Self> {
        let document: PayloadDocument = serde_json::from_str(content)?;
        Self::from_document(&document, settings)
    }

    /// Normalize and classify every catalog sensor against `document`.
    pub fn from_document(document: &PayloadDocument, settings: &Settings) -> Result<Self> {
        let zone = settings.zone()?;

        let mut sensors = settings
            .sensors
            .iter()
            .map(|(id, profile)| {
                let address = address_for(profile, document.is_grouped())?;
                let mut state = SensorState {
                    id: id.clone(),
                    name: profile.name.clone(),
                    description: profile.description.clone(),
                    sensor: profile.sensor(),
                    score: None,
                    observed: (0.0, 0.0),
                    scheme: None,
                };

                if let Some(raw) = document.section(profile.group.as_deref()) {
                    let normalized = normalize(state.sensor, raw, &address, zone);
                    state.scheme = normalized.scheme();
                    state.sensor = normalized.into_inner();
                }

                if state.has_data() {
                    update_status(&mut state.sensor);
                    update_trend(&mut state.sensor);
                    state.score = Some(score_sensor(&state.sensor));
                    state.observed = observed_range(&state.sensor.history);
                }
                Ok(state)
            })
            .collect::<Result<Vec<_>>>()?;

        sensors.sort_by(|a, b| {
            severity(b.status())
                .cmp(&severity(a.status()))
                .then_with(|| a.id.cmp(&b.id))
        });

        let system = system_status(sensors.iter().map(SensorState::status));
        let health = overall_health(sensors.iter().filter_map(|s| s.score));
        let prediction = growth_prediction(health);

        tracing::debug!(
            sensors = sensors.len(),
            system = %system,
            health,
            "Board classified"
        );

        Ok(Self {
            sensors,
            system,
            health,
            prediction,
        })
    }

    /// Look up a sensor by id.
    pub fn get(&self, id: &str) -> Option<&SensorState> {
        self.sensors.iter().find(|s| s.id == id)
    }

    /// Canonical readings of a sensor, oldest first.
    pub fn readings(&self, id: &str) -> Option<Vec<Reading>> {
        self.get(id).map(|s| s.sensor.readings())
    }

    /// Sensors currently in warning or critical state.
    pub fn unhealthy(&self) -> impl Iterator<Item = &SensorState> {
        self.sensors
            .iter()
            .filter(|s| matches!(s.status(), Status::Warning | Status::Critical))
    }
}

/// Address a profile in a document of the given shape.
///
/// The nested file key only applies inside a grouped section; in a flat
/// document several sensors share the same short key (`temperature`).
fn address_for(profile: &SensorProfile, grouped: bool) -> Result<SensorAddress> {
    match (&profile.file_key, grouped) {
        (Some(file_key), true) => SensorAddress::with_alternate(&profile.key, file_key),
        _ => SensorAddress::new(&profile.key),
    }
}

fn severity(status: Status) -> u8 {
    match status {
        Status::Critical => 3,
        Status::Warning => 2,
        Status::Optimal => 1,
        Status::Unknown => 0,
    }
}

/// Render a sensor value with a fixed number of decimals.
pub fn format_value(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

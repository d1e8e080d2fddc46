//! Layered settings: sensor catalog, thresholds, display zone and export defaults.
//!
//! Settings are resolved in order, later sources winning key by key:
//!
//! ```text
//! Settings::default()  ──▶  TOML file (optional)  ──▶  FIELDWATCH__* environment
//! ```
//!
//! Environment keys use `__` as the nesting separator, for example
//! `FIELDWATCH__DISPLAY__UTC_OFFSET_MINUTES=120` or
//! `FIELDWATCH__SENSORS__SOIL_PH__THRESHOLDS__MAX=9`.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::FixedOffset;
use config::{Config, Environment, File};
use fieldwatch_types::{NormalizedSensor, Thresholds};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "FIELDWATCH";

/// Complete runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub display: DisplaySettings,
    pub export: ExportSettings,
    /// Sensor catalog keyed by snake_case sensor id.
    pub sensors: BTreeMap<String, SensorProfile>,
}

/// How instants are rendered for people.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Offset of the display zone from UTC, in minutes.
    pub utc_offset_minutes: i32,
}

/// Defaults applied to export requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Days before today that an export starts when no range is given.
    pub default_lookback_days: i64,
    /// Leading filename segment when a request names none.
    pub data_type: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            default_lookback_days: 7,
            data_type: "sensor".to_string(),
        }
    }
}

/// Static description of one sensor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorProfile {
    /// Display name, e.g. "Soil Temperature".
    pub name: String,
    /// Unit used until upstream declares one.
    pub unit: String,
    pub description: String,
    /// Key of the series in a flat payload, e.g. "soilTemperature".
    pub key: String,
    /// Section of a grouped payload holding the series, e.g. "soil".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Key of the series inside its section, e.g. "temperature".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_key: Option<String>,
    pub thresholds: Thresholds,
}

impl SensorProfile {
    fn new(name: &str, unit: &str, description: &str, key: &str) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            description: description.to_string(),
            key: key.to_string(),
            ..Default::default()
        }
    }

    fn nested(mut self, group: &str, file_key: &str) -> Self {
        self.group = Some(group.to_string());
        self.file_key = Some(file_key.to_string());
        self
    }

    fn thresholds(mut self, min: f64, max: f64, optimal_min: f64, optimal_max: f64) -> Self {
        self.thresholds = Thresholds::new(min, max, optimal_min, optimal_max);
        self
    }

    /// A fresh record carrying this profile's unit and thresholds.
    pub fn sensor(&self) -> NormalizedSensor {
        NormalizedSensor::new(self.unit.clone(), self.thresholds)
    }
}

/// Built-in catalog. Thresholds are illustrative and meant to be overridden.
fn default_catalog() -> BTreeMap<String, SensorProfile> {
    let profiles = [
        (
            "soil_temperature",
            SensorProfile::new("Soil Temperature", "°C", "Ground level", "soilTemperature")
                .nested("soil", "temperature")
                .thresholds(0.0, 50.0, 18.0, 28.0),
        ),
        (
            "soil_moisture",
            SensorProfile::new("Soil Moisture", "%", "Root level", "soilMoisture")
                .nested("soil", "moisture")
                .thresholds(0.0, 100.0, 40.0, 70.0),
        ),
        (
            "soil_ph",
            SensorProfile::new("Soil pH", "pH", "Acidity level", "soilPH")
                .nested("soil", "ph")
                .thresholds(0.0, 14.0, 6.0, 7.5),
        ),
        (
            "soil_conductivity",
            SensorProfile::new(
                "Soil Conductivity",
                "µS/cm",
                "Electrical conductivity",
                "soilConductivity",
            )
            .nested("soil", "conductivity")
            .thresholds(0.0, 2000.0, 200.0, 1200.0),
        ),
        (
            "air_temperature",
            SensorProfile::new("Air Temperature", "°C", "Ambient", "airTemperature")
                .nested("air", "temperature")
                .thresholds(-10.0, 50.0, 20.0, 30.0),
        ),
        (
            "air_humidity",
            SensorProfile::new("Air Humidity", "%", "Ambient", "airHumidity")
                .nested("air", "humidity")
                .thresholds(0.0, 100.0, 40.0, 70.0),
        ),
        (
            "air_co2",
            SensorProfile::new("Air CO2", "ppm", "Carbon dioxide", "airCo2")
                .nested("air", "co2")
                .thresholds(0.0, 5000.0, 400.0, 1000.0),
        ),
        (
            "air_tvoc",
            SensorProfile::new("Air TVOC", "ppb", "Volatile compounds", "airTvoc")
                .nested("air", "tvoc")
                .thresholds(0.0, 2000.0, 0.0, 300.0),
        ),
        (
            "light_intensity",
            SensorProfile::new("Light Intensity", "lux", "Canopy level", "lightIntensity")
                .nested("air", "light")
                .thresholds(0.0, 100_000.0, 10_000.0, 50_000.0),
        ),
    ];

    profiles
        .into_iter()
        .map(|(id, profile)| (id.to_string(), profile))
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display: DisplaySettings::default(),
            export: ExportSettings::default(),
            sensors: default_catalog(),
        }
    }
}

impl Settings {
    /// Load settings, layering an optional file and the environment over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        tracing::debug!(sensors = settings.sensors.len(), "Settings loaded");
        Ok(settings)
    }

    /// The display zone.
    pub fn zone(&self) -> Result<FixedOffset> {
        let minutes = self.display.utc_offset_minutes;
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(Error::InvalidOffset(minutes))
    }

    /// Look up a catalog profile by sensor id.
    pub fn profile(&self, id: &str) -> Option<&SensorProfile> {
        self.sensors.get(id)
    }
}

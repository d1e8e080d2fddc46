//! Export orchestration: request resolution, filenames and dispatch.
//!
//! ```text
//! ExportRequest ──▶ validate ids & format ──▶ resolve range, metadata, filename
//!                                                  │
//!                          ┌───────────────────────┴──────────────┐
//!                          ▼                                      ▼
//!                 csv / excel: align ──▶ render_csv       json: render_json
//!                          └───────────────────────┬──────────────┘
//!                                                  ▼
//!                                           ExportArtifact ──▶ ExportSink
//! ```
//!
//! Nothing is handed to a sink until the whole body has been built.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::align::{align, SensorId, SeriesSet};
use super::format::{render_csv, render_json, ExportFormat, SensorMeta};
use super::sink::ExportSink;
use crate::config::Settings;
use crate::data::time::{date_range_from_timeframe, DateRange, Timeframe};
use crate::error::{Error, ExportError, ExportStage, Result};

/// A sensor named in an export request.
///
/// Either a bare id, or an id with display overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorSpec {
    Id(String),
    Detailed {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
}

impl SensorSpec {
    pub fn id(&self) -> &str {
        match self {
            SensorSpec::Id(id) | SensorSpec::Detailed { id, .. } => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            SensorSpec::Id(_) => None,
            SensorSpec::Detailed { name, .. } => name.as_deref(),
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            SensorSpec::Id(_) => None,
            SensorSpec::Detailed { unit, .. } => unit.as_deref(),
        }
    }
}

impl From<&str> for SensorSpec {
    fn from(id: &str) -> Self {
        SensorSpec::Id(id.to_string())
    }
}

/// What to export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Format name as given by the caller: `csv`, `json` or `excel`.
    pub format: String,
    /// Sensors in column order. Empty means every series supplied.
    #[serde(default)]
    pub sensors: Vec<SensorSpec>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// Window used for whichever of `start`/`end` is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    /// Leading filename segment; the configured default when missing.
    #[serde(default)]
    pub data_type: Option<String>,
}

impl ExportRequest {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            sensors: Vec::new(),
            start: None,
            end: None,
            timeframe: None,
            data_type: None,
        }
    }

    pub fn sensor(mut self, spec: impl Into<SensorSpec>) -> Self {
        self.sensors.push(spec.into());
        self
    }

    pub fn range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(timeframe);
        self
    }

    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }
}

/// A finished export, ready to be handed to a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// `<data_type>_data_<start>_to_<end>.<ext>`
pub fn export_filename(data_type: &str, range: &DateRange, format: ExportFormat) -> String {
    format!(
        "{}_data_{}_to_{}.{}",
        data_type,
        range.start,
        range.end,
        format.extension()
    )
}

/// Drives exports with defaults and sensor metadata from [`Settings`].
#[derive(Debug, Clone, Copy)]
pub struct Exporter<'a> {
    settings: &'a Settings,
}

impl<'a> Exporter<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Build the artifact for `request` from `data`.
    ///
    /// `now` fixes the default date range and the export timestamp. Every
    /// failure is logged here and returned with its cause.
    pub fn export(
        &self,
        request: &ExportRequest,
        data: &SeriesSet,
        now: DateTime<Utc>,
    ) -> std::result::Result<ExportArtifact, ExportError> {
        let result = self.build(request, data, now);
        if let Err(e) = &result {
            tracing::error!(
                stage = %e.stage,
                error = %e.source,
                format = %request.format,
                "Export failed"
            );
        }
        result
    }

    /// Build the artifact and hand it to `sink`.
    pub fn export_to<S: ExportSink>(
        &self,
        request: &ExportRequest,
        data: &SeriesSet,
        now: DateTime<Utc>,
        sink: &mut S,
    ) -> std::result::Result<ExportArtifact, ExportError> {
        let artifact = self.export(request, data, now)?;
        if let Err(source) = sink.deliver(&artifact) {
            let e = ExportError::new(ExportStage::Writing, source);
            tracing::error!(
                stage = %e.stage,
                error = %e.source,
                filename = %artifact.filename,
                "Export failed"
            );
            return Err(e);
        }
        Ok(artifact)
    }

    fn build(
        &self,
        request: &ExportRequest,
        data: &SeriesSet,
        now: DateTime<Utc>,
    ) -> std::result::Result<ExportArtifact, ExportError> {
        let validating = |e| ExportError::new(ExportStage::Validating, e);

        let format: ExportFormat = request.format.parse().map_err(validating)?;
        let zone = self.settings.zone().map_err(validating)?;
        let columns = self.resolve_columns(request, data).map_err(validating)?;
        let data_type = self.resolve_data_type(request).map_err(validating)?;
        let range = self.resolve_range(request, now).map_err(validating)?;
        let filename = export_filename(&data_type, &range, format);

        let body = match format {
            ExportFormat::Csv | ExportFormat::Excel => {
                let requested = columns.iter().fold(SeriesSet::new(), |set, meta| {
                    let readings = data.get(meta.id.as_str()).unwrap_or_default().to_vec();
                    set.with(meta.id.clone(), readings)
                });
                render_csv(&align(&requested), &columns, zone)
            }
            ExportFormat::Json => {
                let label = filename.split('_').next().unwrap_or_default();
                render_json(data, &columns, label, now)
                    .map_err(|e| ExportError::new(ExportStage::Serializing, e))?
            }
        };

        tracing::info!(
            filename = %filename,
            sensors = columns.len(),
            bytes = body.len(),
            "Export ready"
        );

        Ok(ExportArtifact {
            format,
            content_type: format.content_type(),
            filename,
            body: body.into_bytes(),
        })
    }

    /// Metadata per requested sensor: request overrides, then the catalog,
    /// then the id itself with an empty unit.
    fn resolve_columns(
        &self,
        request: &ExportRequest,
        data: &SeriesSet,
    ) -> Result<Vec<SensorMeta>> {
        if request.sensors.is_empty() {
            return data.ids().map(|id| Ok(self.meta(id.clone(), None, None))).collect();
        }

        request
            .sensors
            .iter()
            .map(|spec| {
                let id = SensorId::new(spec.id())?;
                Ok(self.meta(id, spec.name(), spec.unit()))
            })
            .collect()
    }

    fn meta(&self, id: SensorId, name: Option<&str>, unit: Option<&str>) -> SensorMeta {
        let profile = self.settings.profile(id.as_str());
        let name = name
            .or(profile.map(|p| p.name.as_str()).filter(|n| !n.is_empty()))
            .unwrap_or(id.as_str())
            .to_string();
        let unit = unit
            .or(profile.map(|p| p.unit.as_str()))
            .unwrap_or_default()
            .to_string();
        SensorMeta { id, name, unit }
    }

    fn resolve_data_type(&self, request: &ExportRequest) -> Result<String> {
        let data_type = request
            .data_type
            .as_deref()
            .unwrap_or(&self.settings.export.data_type);
        if data_type.trim().is_empty() || data_type.contains(['/', '\\']) {
            return Err(Error::invalid_identifier("data type", data_type));
        }
        Ok(data_type.to_string())
    }

    /// Explicit dates win; missing ends come from the timeframe when given,
    /// otherwise from the configured lookback ending today.
    fn resolve_range(&self, request: &ExportRequest, now: DateTime<Utc>) -> Result<DateRange> {
        if let (Some(start), Some(end)) = (request.start, request.end) {
            return Ok(DateRange::new(start, end));
        }

        let today = now.date_naive();
        let fallback = match request.timeframe {
            Some(timeframe) => date_range_from_timeframe(timeframe, today),
            None => DateRange::lookback(today, self.settings.export.default_lookback_days)?,
        };
        Ok(DateRange::new(
            request.start.unwrap_or(fallback.start),
            request.end.unwrap_or(fallback.end),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::sink::MemorySink;
    use chrono::TimeZone;
    use fieldwatch_types::Reading;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 15, 30, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 0, 0, 0).unwrap()
    }

    fn data() -> SeriesSet {
        SeriesSet::new()
            .with(
                SensorId::new("soil_moisture").unwrap(),
                vec![Reading::new(t(1), 41.0), Reading::new(t(2), 43.5)],
            )
            .with(
                SensorId::new("probe_7").unwrap(),
                vec![Reading::new(t(2), 0.0)],
            )
    }

    #[test]
    fn test_export_filename() {
        let range = DateRange::new(date(2025, 1, 1), date(2025, 1, 7));
        assert_eq!(
            export_filename("sensor", &range, ExportFormat::Csv),
            "sensor_data_2025-01-01_to_2025-01-07.csv"
        );
        assert_eq!(
            export_filename("sensor", &range, ExportFormat::Excel),
            "sensor_data_2025-01-01_to_2025-01-07.xlsx"
        );
    }

    #[test]
    fn default_range_is_last_week() {
        let settings = Settings::default();
        let artifact = Exporter::new(&settings)
            .export(&ExportRequest::new("json"), &data(), now())
            .unwrap();
        assert_eq!(artifact.filename, "sensor_data_2025-03-03_to_2025-03-10.json");
        assert_eq!(artifact.content_type, "application/json;charset=utf-8");
    }

    #[test]
    fn timeframe_fills_missing_dates() {
        let settings = Settings::default();
        let request = ExportRequest::new("csv").timeframe(Timeframe::D30);
        let artifact = Exporter::new(&settings).export(&request, &data(), now()).unwrap();
        assert_eq!(artifact.filename, "sensor_data_2025-02-08_to_2025-03-10.csv");

        let mut request = ExportRequest::new("csv").timeframe(Timeframe::H24);
        request.end = Some(date(2025, 3, 5));
        let artifact = Exporter::new(&settings).export(&request, &data(), now()).unwrap();
        assert_eq!(artifact.filename, "sensor_data_2025-03-09_to_2025-03-05.csv");
    }

    #[test]
    fn csv_uses_catalog_then_request_then_id() {
        let settings = Settings::default();
        let request = ExportRequest::new("csv")
            .sensor("soil_moisture")
            .sensor(SensorSpec::Detailed {
                id: "probe_7".into(),
                name: Some("Probe 7".into()),
                unit: Some("mV".into()),
            })
            .sensor("unlisted")
            .range(date(2025, 3, 1), date(2025, 3, 2));

        let artifact = Exporter::new(&settings).export(&request, &data(), now()).unwrap();
        let csv = String::from_utf8(artifact.body).unwrap();
        assert_eq!(
            csv,
            "Timestamp,Soil Moisture (%),Probe 7 (mV),unlisted ()\n\
             3/1/2025 12:00:00 AM,41,,\n\
             3/2/2025 12:00:00 AM,43.5,0,\n"
        );
    }

    #[test]
    fn excel_is_csv_with_other_extension() {
        let settings = Settings::default();
        let exporter = Exporter::new(&settings);
        let range = (date(2025, 3, 1), date(2025, 3, 2));

        let csv = exporter
            .export(&ExportRequest::new("csv").range(range.0, range.1), &data(), now())
            .unwrap();
        let excel = exporter
            .export(&ExportRequest::new("excel").range(range.0, range.1), &data(), now())
            .unwrap();

        assert_eq!(csv.body, excel.body);
        assert_eq!(excel.format, ExportFormat::Excel);
        assert!(excel.filename.ends_with(".xlsx"));
    }

    #[test]
    fn json_data_type_comes_from_filename() {
        let settings = Settings::default();
        let request = ExportRequest::new("json")
            .sensor("soil_moisture")
            .data_type("greenhouse_a");
        let artifact = Exporter::new(&settings).export(&request, &data(), now()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&artifact.body).unwrap();
        assert_eq!(value["dataType"], "greenhouse");
        assert_eq!(value["exportDate"], "2025-03-10T15:30:00.000Z");
        assert_eq!(value["sensors"]["soil_moisture"]["name"], "Soil Moisture");
        assert!(value["sensors"].get("probe_7").is_none());
    }

    #[test]
    fn unsupported_format_is_rejected() {
        let settings = Settings::default();
        let mut sink = MemorySink::default();
        let err = Exporter::new(&settings)
            .export_to(&ExportRequest::new("pdf"), &data(), now(), &mut sink)
            .unwrap_err();

        assert_eq!(err.stage, ExportStage::Validating);
        assert!(matches!(err.source, Error::UnsupportedFormat(ref f) if f == "pdf"));
        assert!(sink.artifacts.is_empty());
    }

    #[test]
    fn empty_sensor_id_is_rejected() {
        let settings = Settings::default();
        let request = ExportRequest::new("csv").sensor("soil_moisture").sensor("");
        let err = Exporter::new(&settings).export(&request, &data(), now()).unwrap_err();
        assert!(matches!(err.source, Error::InvalidIdentifier { kind: "sensor id", .. }));
    }

    #[test]
    fn path_like_data_type_is_rejected() {
        let settings = Settings::default();
        let request = ExportRequest::new("csv").data_type("../etc");
        let err = Exporter::new(&settings).export(&request, &data(), now()).unwrap_err();
        assert!(matches!(err.source, Error::InvalidIdentifier { kind: "data type", .. }));
    }

    #[test]
    fn no_sensors_exports_every_series() {
        let settings = Settings::default();
        let request = ExportRequest::new("csv").range(date(2025, 3, 1), date(2025, 3, 2));
        let artifact = Exporter::new(&settings).export(&request, &data(), now()).unwrap();
        let csv = String::from_utf8(artifact.body).unwrap();
        assert!(csv.starts_with("Timestamp,Soil Moisture (%),probe_7 ()\n"));
    }

    #[test]
    fn delivered_artifact_reaches_sink() {
        let settings = Settings::default();
        let mut sink = MemorySink::default();
        let artifact = Exporter::new(&settings)
            .export_to(&ExportRequest::new("json"), &data(), now(), &mut sink)
            .unwrap();
        assert_eq!(sink.artifacts, vec![artifact]);
    }

    #[test]
    fn sensor_specs_deserialize_both_shapes() {
        let json = r#"{
            "format": "csv",
            "sensors": ["soil_ph", { "id": "probe_7", "unit": "mV" }],
            "start": "2025-03-01"
        }"#;
        let request: ExportRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.sensors[0], SensorSpec::from("soil_ph"));
        assert_eq!(request.sensors[1].id(), "probe_7");
        assert_eq!(request.sensors[1].unit(), Some("mV"));
        assert_eq!(request.sensors[1].name(), None);
        assert_eq!(request.start, Some(date(2025, 3, 1)));
        assert_eq!(request.end, None);
        assert_eq!(request.timeframe, None);
    }

    #[test]
    fn deserialized_timeframe_drives_range() {
        let json = r#"{ "format": "json", "timeframe": "30d" }"#;
        let request: ExportRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.timeframe, Some(Timeframe::D30));

        let settings = Settings::default();
        let artifact = Exporter::new(&settings).export(&request, &data(), now()).unwrap();
        assert_eq!(artifact.filename, "sensor_data_2025-02-08_to_2025-03-10.json");
    }

    #[test]
    fn oversized_lookback_is_a_validation_error() {
        let mut settings = Settings::default();
        settings.export.default_lookback_days = i64::MAX / 100_000;
        let err = Exporter::new(&settings)
            .export(&ExportRequest::new("csv"), &data(), now())
            .unwrap_err();

        assert_eq!(err.stage, ExportStage::Validating);
        assert!(matches!(err.source, Error::InvalidLookback(_)));

        // Explicit dates never consult the lookback
        let request = ExportRequest::new("csv").range(date(2025, 3, 1), date(2025, 3, 2));
        assert!(Exporter::new(&settings).export(&request, &data(), now()).is_ok());
    }
}

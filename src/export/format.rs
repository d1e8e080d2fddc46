//! Export formats and their serializers.
//!
//! CSV is the union-aligned table. JSON is the per-sensor view, keeping
//! each sensor's own timestamps. Excel is declared as a format of its own
//! but is written by the CSV serializer; only the extension differs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::align::{ExportTable, SensorId, SeriesSet};
use crate::data::time::{csv_timestamp, iso_instant};
use crate::error::{Error, Result};

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Json,
    /// Alias of [`ExportFormat::Csv`] with an `xlsx` extension.
    Excel,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Json, ExportFormat::Excel];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "excel",
        }
    }

    /// File extension used in export filenames.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xlsx",
        }
    }

    /// MIME type of the artifact body.
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv | ExportFormat::Excel => "text/csv;charset=utf-8",
            ExportFormat::Json => "application/json;charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "excel" => Ok(ExportFormat::Excel),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display metadata of one exported sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorMeta {
    pub id: SensorId,
    pub name: String,
    pub unit: String,
}

impl SensorMeta {
    /// Column header, `<name> (<unit>)`.
    pub fn header(&self) -> String {
        format!("{} ({})", self.name, self.unit)
    }
}

/// Render an aligned table as CSV.
///
/// `columns` describes `table.sensors` in the same order. Absent values are
/// empty fields and every line, the last included, ends with `\n`.
pub fn render_csv(table: &ExportTable, columns: &[SensorMeta], zone: FixedOffset) -> String {
    let mut out = String::from("Timestamp");
    for sensor in &table.sensors {
        out.push(',');
        match columns.iter().find(|meta| meta.id == *sensor) {
            Some(meta) => out.push_str(&escape_field(&meta.header())),
            None => out.push_str(&escape_field(&format!("{} ()", sensor))),
        }
    }
    out.push('\n');

    for row in &table.rows {
        out.push_str(&escape_field(&csv_timestamp(row.time, zone)));
        for cell in &row.cells {
            out.push(',');
            if let Some(value) = cell {
                out.push_str(&format_number(*value));
            }
        }
        out.push('\n');
    }
    out
}

/// Render a number the way spreadsheet-bound JavaScript exports do.
///
/// Shortest round-trip digits; exponent form with an explicit sign from
/// 1e21 upward and below 1e-6.
fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }

    let exponential = format!("{:e}", value);
    match exponential.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => exponential,
    }
}

/// Quote a field only when it holds a delimiter, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render the per-sensor JSON document.
///
/// Sensors are emitted in `columns` order; a sensor without a series in
/// `series` is left out.
pub fn render_json(
    series: &SeriesSet,
    columns: &[SensorMeta],
    data_type: &str,
    exported_at: DateTime<Utc>,
) -> Result<String> {
    let sensors = columns
        .iter()
        .filter_map(|meta| {
            series.get(meta.id.as_str()).map(|readings| {
                let readings = readings
                    .iter()
                    .map(|r| JsonReading {
                        timestamp: iso_instant(r.time),
                        value: r.value,
                    })
                    .collect();
                (
                    meta.id.as_str(),
                    JsonSensor {
                        name: &meta.name,
                        unit: &meta.unit,
                        readings,
                    },
                )
            })
        })
        .collect();

    let document = JsonExport {
        export_date: iso_instant(exported_at),
        data_type,
        sensors: OrderedSensors(sensors),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    export_date: String,
    data_type: &'a str,
    sensors: OrderedSensors<'a>,
}

/// Sensor map serialized in insertion order.
struct OrderedSensors<'a>(Vec<(&'a str, JsonSensor<'a>)>);

impl Serialize for OrderedSensors<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, sensor) in &self.0 {
            map.serialize_entry(id, sensor)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct JsonSensor<'a> {
    name: &'a str,
    unit: &'a str,
    readings: Vec<JsonReading>,
}

#[derive(Serialize)]
struct JsonReading {
    timestamp: String,
    value: f64,
}

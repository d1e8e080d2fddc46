//! Union alignment of independent per-sensor series.
//!
//! ```text
//! A: t1=10  t2=20            Timestamp  A   B
//! B: t1=5           ──▶      t1         10  5
//!                            t2         20  -
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use fieldwatch_types::Reading;

use crate::error::{Error, Result};

/// Validated, non-empty sensor identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SensorId(String);

impl SensorId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::invalid_identifier("sensor id", id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SensorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-sensor series in caller order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    series: Vec<(SensorId, Vec<Reading>)>,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a series, replacing any earlier one with the same id in place.
    pub fn insert(&mut self, id: SensorId, readings: Vec<Reading>) {
        match self.series.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => *slot = readings,
            None => self.series.push((id, readings)),
        }
    }

    /// Builder form of [`SeriesSet::insert`].
    pub fn with(mut self, id: SensorId, readings: Vec<Reading>) -> Self {
        self.insert(id, readings);
        self
    }

    pub fn get(&self, id: &str) -> Option<&[Reading]> {
        self.series
            .iter()
            .find(|(existing, _)| existing.as_str() == id)
            .map(|(_, readings)| readings.as_slice())
    }

    pub fn ids(&self) -> impl Iterator<Item = &SensorId> {
        self.series.iter().map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SensorId, &[Reading])> {
        self.series.iter().map(|(id, r)| (id, r.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// One union timestamp with a cell per sensor column.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub time: DateTime<Utc>,
    /// Values in column order; `None` where the sensor had no reading.
    pub cells: Vec<Option<f64>>,
}

/// Union-aligned table. Row times are strictly ascending and unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTable {
    pub sensors: Vec<SensorId>,
    pub rows: Vec<ExportRow>,
}

impl ExportTable {
    /// Value of `sensor` in `row`, or `None` when absent or unknown.
    pub fn value(&self, row: &ExportRow, sensor: &str) -> Option<f64> {
        let column = self.sensors.iter().position(|id| id.as_str() == sensor)?;
        row.cells.get(column).copied().flatten()
    }
}

/// Merge every series into one table over the union of their timestamps.
///
/// Timestamps are compared as instants. A sensor with several readings at
/// the same instant contributes the last one.
pub fn align(series: &SeriesSet) -> ExportTable {
    let lookups: Vec<BTreeMap<DateTime<Utc>, f64>> = series
        .iter()
        .map(|(_, readings)| readings.iter().map(|r| (r.time, r.value)).collect())
        .collect();

    let times: BTreeSet<DateTime<Utc>> = lookups
        .iter()
        .flat_map(|lookup| lookup.keys().copied())
        .collect();

    let rows = times
        .into_iter()
        .map(|time| ExportRow {
            time,
            cells: lookups
                .iter()
                .map(|lookup| lookup.get(&time).copied())
                .collect(),
        })
        .collect();

    ExportTable {
        sensors: series.ids().cloned().collect(),
        rows,
    }
}

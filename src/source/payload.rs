//! Upstream payload documents.
//!
//! Two document shapes are seen in the wild:
//!
//! ```text
//! flat:     { "soilTemperature": { "unit": "°C", "history": [...] }, ... }
//! grouped:  { "soil": { "temperature": { "unit": "°C", "history": [...] }, ... }, ... }
//! ```

use std::collections::BTreeMap;

use fieldwatch_types::{RawPayload, RawSeries};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Keys that only appear on a series object, never on a section.
const SERIES_KEYS: &[&str] = &["unit", "history"];

/// A complete upstream document in either shape.
///
/// Only object-valued top-level entries are considered. The document is
/// flat when any of them looks like a series (see [`looks_like_series`]);
/// otherwise it is grouped. A document with no object entries is flat.
///
/// A series that fails to parse is dropped with a warning; the rest of the
/// document survives.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadDocument {
    /// Series nested under a file-level section.
    Grouped(BTreeMap<String, RawPayload>),
    /// Series keyed directly by sensor key.
    Flat(RawPayload),
}

impl PayloadDocument {
    pub fn is_grouped(&self) -> bool {
        matches!(self, PayloadDocument::Grouped(_))
    }

    /// The payload a sensor in `group` is normalized against.
    ///
    /// A flat document serves every group. A grouped document serves only
    /// the named section; sensors without a section get nothing.
    pub fn section(&self, group: Option<&str>) -> Option<&RawPayload> {
        match self {
            PayloadDocument::Flat(payload) => Some(payload),
            PayloadDocument::Grouped(sections) => group.and_then(|g| sections.get(g)),
        }
    }

    /// Total number of series in the document.
    pub fn series_count(&self) -> usize {
        match self {
            PayloadDocument::Flat(payload) => payload.len(),
            PayloadDocument::Grouped(sections) => sections.values().map(BTreeMap::len).sum(),
        }
    }
}

impl<'de> Deserialize<'de> for PayloadDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let objects = object_entries(entries, None);

        if objects.is_empty() || objects.values().any(looks_like_series) {
            return Ok(PayloadDocument::Flat(parse_series(objects, None)));
        }

        let sections = objects
            .into_iter()
            .map(|(name, section)| {
                let members = match section {
                    Value::Object(members) => members.into_iter().collect(),
                    _ => BTreeMap::new(),
                };
                let series = parse_series(object_entries(members, Some(&name)), Some(&name));
                (name, series)
            })
            .collect();
        Ok(PayloadDocument::Grouped(sections))
    }
}

/// A series object is empty, carries `unit` or `history`, or has no
/// object-valued members (a section always nests objects).
fn looks_like_series(value: &Value) -> bool {
    value.as_object().map_or(false, |obj| {
        obj.is_empty()
            || SERIES_KEYS.iter().any(|k| obj.contains_key(*k))
            || !obj.values().any(Value::is_object)
    })
}

/// Keep object-valued entries, logging the rest.
fn object_entries(
    entries: BTreeMap<String, Value>,
    section: Option<&str>,
) -> BTreeMap<String, Value> {
    entries
        .into_iter()
        .filter(|(key, value)| {
            if value.is_object() {
                return true;
            }
            tracing::debug!(key = %key, section = ?section, "Skipping non-object payload entry");
            false
        })
        .collect()
}

fn parse_series(entries: BTreeMap<String, Value>, section: Option<&str>) -> RawPayload {
    entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<RawSeries>(value) {
            Ok(series) => Some((key, series)),
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    section = ?section,
                    error = %e,
                    "Dropping malformed series"
                );
                None
            }
        })
        .collect()
}

impl Default for PayloadDocument {
    fn default() -> Self {
        PayloadDocument::Flat(RawPayload::new())
    }
}

//! Time labels, relative strings and upstream time parsing.
//!
//! All functions are pure: the current instant and the display zone are
//! passed in by the caller.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Days, Duration, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc,
};
use fieldwatch_types::RawTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Naive layouts accepted from upstream, interpreted in the display zone.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Resolution class of a chart or export window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeframe {
    /// Hour-scale, the last 24 hours.
    #[serde(rename = "24h")]
    H24,
    /// Day-scale, the last 7 days.
    #[default]
    #[serde(rename = "7d")]
    D7,
    /// Month-scale, the last 30 days.
    #[serde(rename = "30d")]
    D30,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::H24 => "24h",
            Timeframe::D7 => "7d",
            Timeframe::D30 => "30d",
        }
    }

    /// Number of days covered by the window.
    pub fn days(&self) -> u64 {
        match self {
            Timeframe::H24 => 1,
            Timeframe::D7 => 7,
            Timeframe::D30 => 30,
        }
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "24h" => Ok(Timeframe::H24),
            "7d" => Ok(Timeframe::D7),
            "30d" => Ok(Timeframe::D30),
            other => Err(Error::UnknownTimeframe(other.to_string())),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The range ending `today` and starting `days` earlier.
    ///
    /// Fails for a negative count or one reaching past the earliest
    /// representable date.
    pub fn lookback(today: NaiveDate, days: i64) -> Result<Self> {
        u64::try_from(days)
            .ok()
            .and_then(|d| today.checked_sub_days(Days::new(d)))
            .map(|start| Self { start, end: today })
            .ok_or(Error::InvalidLookback(days))
    }
}

/// Default range for a timeframe: today minus 1, 7 or 30 days, up to today.
pub fn date_range_from_timeframe(timeframe: Timeframe, today: NaiveDate) -> DateRange {
    let start = today
        .checked_sub_days(Days::new(timeframe.days()))
        .unwrap_or(NaiveDate::MIN);
    DateRange::new(start, today)
}

/// Axis label for a timeframe: `01:08 AM`, `Sat, 01 AM` or `Jun 14`.
pub fn time_label(instant: DateTime<Utc>, timeframe: Timeframe, zone: FixedOffset) -> String {
    let local = instant.with_timezone(&zone);
    match timeframe {
        Timeframe::H24 => local.format("%I:%M %p").to_string(),
        Timeframe::D7 => local.format("%a, %I %p").to_string(),
        Timeframe::D30 => local.format("%b %-d").to_string(),
    }
}

/// Clock time, e.g. `01:08 AM`.
pub fn format_time(instant: DateTime<Utc>, zone: FixedOffset) -> String {
    instant.with_timezone(&zone).format("%I:%M %p").to_string()
}

/// Clock time prefixed with `Today, `.
pub fn format_current_time(now: DateTime<Utc>, zone: FixedOffset) -> String {
    format!("Today, {}", format_time(now, zone))
}

/// Label attached to normalized history entries, e.g. `6/14/2025, 1:08:02 AM`.
pub fn display_label(instant: DateTime<Utc>, zone: FixedOffset) -> String {
    instant
        .with_timezone(&zone)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

/// Row timestamp used in CSV exports, e.g. `6/14/2025 1:08:02 AM`.
pub fn csv_timestamp(instant: DateTime<Utc>, zone: FixedOffset) -> String {
    instant
        .with_timezone(&zone)
        .format("%-m/%-d/%Y %-I:%M:%S %p")
        .to_string()
}

/// ISO instant with millisecond precision and a `Z` suffix.
pub fn iso_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// How long ago `instant` was, relative to `now`.
///
/// Anything older than a week falls back to the calendar date in `zone`.
pub fn relative_time(instant: DateTime<Utc>, now: DateTime<Utc>, zone: FixedOffset) -> String {
    let elapsed = now.signed_duration_since(instant);

    if elapsed < Duration::minutes(1) {
        return "just now".to_string();
    }
    if elapsed < Duration::hours(1) {
        return plural(elapsed.num_minutes(), "minute");
    }
    if elapsed < Duration::days(1) {
        return plural(elapsed.num_hours(), "hour");
    }
    if elapsed < Duration::days(7) {
        return plural(elapsed.num_days(), "day");
    }
    instant.with_timezone(&zone).format("%b %-d, %Y").to_string()
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Parse an upstream time into a UTC instant.
///
/// Accepts RFC 3339 with an offset, naive date-times (taken to be in
/// `zone`), bare dates (midnight in `zone`) and epoch milliseconds.
/// Returns `None` for anything else.
pub fn parse_instant(raw: &RawTime, zone: FixedOffset) -> Option<DateTime<Utc>> {
    match raw {
        RawTime::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
        RawTime::FractionalMillis(ms) if ms.is_finite() => {
            Utc.timestamp_millis_opt(ms.round() as i64).single()
        }
        RawTime::FractionalMillis(_) => None,
        RawTime::Text(text) => parse_instant_text(text.trim(), zone),
    }
}

fn parse_instant_text(s: &str, zone: FixedOffset) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    zone.from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

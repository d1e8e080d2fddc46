//! Classification enums.

use std::fmt;

/// Operational status of a single sensor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Status {
    Optimal,
    Warning,
    Critical,
    /// Not yet classified.
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "inactive"))]
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Optimal => "optimal",
            Status::Warning => "warning",
            Status::Critical => "critical",
            Status::Unknown => "unknown",
        }
    }

    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Optimal => "OK",
            Status::Warning => "WARN",
            Status::Critical => "CRIT",
            Status::Unknown => "--",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of change between the two most recent readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Trend::Increasing => "↑",
            Trend::Decreasing => "↓",
            Trend::Stable => "→",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate status across a set of sensors.
///
/// Ordered from best to worst, so the worst of several statuses is their
/// maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SystemStatus {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl SystemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemStatus::Normal => "normal",
            SystemStatus::Warning => "warning",
            SystemStatus::Critical => "critical",
        }
    }
}

impl From<Status> for SystemStatus {
    /// Unclassified sensors do not degrade the system.
    fn from(status: Status) -> Self {
        match status {
            Status::Critical => SystemStatus::Critical,
            Status::Warning => SystemStatus::Warning,
            Status::Optimal | Status::Unknown => SystemStatus::Normal,
        }
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative growth outlook derived from a health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GrowthPrediction {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl GrowthPrediction {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthPrediction::Excellent => "Excellent",
            GrowthPrediction::Good => "Good",
            GrowthPrediction::Fair => "Fair",
            GrowthPrediction::Poor => "Poor",
            GrowthPrediction::Critical => "Critical",
        }
    }
}

impl fmt::Display for GrowthPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

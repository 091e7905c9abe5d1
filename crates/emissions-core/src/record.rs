//! Typed rows produced at the loader boundary.

use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value a map is sized and ranked by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Summed `emissions_quantity`, or tonnes CO2 for facility sheets.
    #[default]
    Emissions,
    /// Summed `activity`.
    Activity,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Emissions, Metric::Activity];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Emissions => "emissions",
            Metric::Activity => "activity",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown metric {0:?}; expected `emissions` or `activity`")]
pub struct ParseMetricError(pub String);

impl FromStr for Metric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "emissions" | "emission" => Ok(Metric::Emissions),
            "activity" => Ok(Metric::Activity),
            other => Err(ParseMetricError(other.to_string())),
        }
    }
}

/// `<category>-<source>` identifier of a sheet or archive member.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetKey {
    pub category: String,
    pub source: String,
}

impl DatasetKey {
    pub fn new(category: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            source: source.into(),
        }
    }

    /// Split at the first `-`. Text without a separator names both halves.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once('-') {
            Some((category, source)) if !category.is_empty() && !source.is_empty() => {
                Self::new(category.trim(), source.trim())
            }
            _ => Self::new(raw, raw),
        }
    }

    /// Human readable label used for layer names and the legend.
    pub fn label(&self) -> String {
        if self.category == self.source {
            self.category.clone()
        } else {
            format!("{} — {}", self.category, self.source)
        }
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.category == self.source {
            f.write_str(&self.category)
        } else {
            write!(f, "{}-{}", self.category, self.source)
        }
    }
}

/// One CSV row of an emissions-sources file after typing.
///
/// Every cell that may be blank or malformed in the wild is optional; the
/// aggregator decides how missing values count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceRow {
    pub start_time: Option<NaiveDateTime>,
    pub source_id: String,
    pub source_name: String,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub activity_units: String,
    pub gas: String,
    pub emissions_quantity: Option<f64>,
    pub activity: Option<f64>,
}

/// Aggregated yearly totals for one source.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmissionRecord {
    pub source_id: String,
    pub source_name: String,
    pub category: String,
    pub source_label: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub emissions: f64,
    pub activity: f64,
    pub gas_type: String,
    pub activity_units: String,
}

impl EmissionRecord {
    pub fn metric_value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Emissions => self.emissions,
            Metric::Activity => self.activity,
        }
    }

    pub fn location(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Facility row of a spreadsheet sheet.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FacilityRecord {
    pub facility: String,
    pub owner: String,
    pub tonnes_co2: f64,
    pub biogenic: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl FacilityRecord {
    pub fn location(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_splits_on_first_dash() {
        let key = DatasetKey::parse("power-electricity-generation");
        assert_eq!(key.category, "power");
        assert_eq!(key.source, "electricity-generation");
        assert_eq!(key.label(), "power — electricity-generation");
    }

    #[test]
    fn key_without_dash_uses_whole_text() {
        let key = DatasetKey::parse("cement");
        assert_eq!(key, DatasetKey::new("cement", "cement"));
        assert_eq!(key.label(), "cement");
        assert_eq!(key.to_string(), "cement");
    }

    #[test]
    fn metric_parses_case_insensitively() {
        assert_eq!("Activity".parse::<Metric>(), Ok(Metric::Activity));
        assert_eq!(" emissions ".parse::<Metric>(), Ok(Metric::Emissions));
        assert!("volume".parse::<Metric>().is_err());
    }
}

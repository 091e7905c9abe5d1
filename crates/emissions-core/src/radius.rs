//! Linear min/max scaling of marker radii.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{dataset::Dataset, record::Metric};

/// Smallest marker radius in pixels.
pub const SIZE_MIN: f64 = 1.0;
/// Largest marker radius in pixels.
pub const SIZE_MAX: f64 = 10.0;

/// Linear map from `[min, max]` of a collection onto `[SIZE_MIN, SIZE_MAX]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RadiusScale {
    pub min: f64,
    pub max: f64,
    pub slope: f64,
    pub intercept: f64,
}

impl RadiusScale {
    /// Fit over the finite values of `values`. Returns `None` when there are none.
    ///
    /// A single distinct value yields a slope of 1, so every record gets the
    /// same radius.
    pub fn fit<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;
        Some(Self::from_bounds(min, max))
    }

    pub fn from_bounds(min: f64, max: f64) -> Self {
        let slope = if max != min {
            (SIZE_MAX - SIZE_MIN) / (max - min)
        } else {
            1.0
        };
        let intercept = SIZE_MAX - slope * max;
        Self {
            min,
            max,
            slope,
            intercept,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    /// Radius for `value`, rounded to two decimals.
    pub fn radius(&self, value: f64) -> f64 {
        let raw = self.slope * value + self.intercept;
        (raw * 100.0).round() / 100.0
    }
}

/// Whether min/max are taken per layer or across the whole dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleScope {
    #[default]
    PerLayer,
    Global,
}

impl ScaleScope {
    pub fn as_str(self) -> &'static str {
        match self {
            ScaleScope::PerLayer => "per-layer",
            ScaleScope::Global => "global",
        }
    }
}

impl fmt::Display for ScaleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown scale scope {0:?}; expected `per-layer` or `global`")]
pub struct ParseScopeError(pub String);

impl FromStr for ScaleScope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "per-layer" | "layer" | "per-sheet" | "sheet" => Ok(ScaleScope::PerLayer),
            "global" => Ok(ScaleScope::Global),
            other => Err(ParseScopeError(other.to_string())),
        }
    }
}

/// One scale per dataset layer, index-aligned with `Dataset::layers`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScalePlan {
    pub scope: ScaleScope,
    pub metric: Metric,
    scales: Vec<Option<RadiusScale>>,
}

impl ScalePlan {
    pub fn build(dataset: &Dataset, metric: Metric, scope: ScaleScope) -> Self {
        let per_layer: Vec<Vec<f64>> = dataset
            .layers()
            .iter()
            .map(|layer| layer.records.metric_values(metric))
            .collect();

        let scales = match scope {
            ScaleScope::PerLayer => per_layer
                .into_iter()
                .map(RadiusScale::fit)
                .collect(),
            ScaleScope::Global => {
                let global = RadiusScale::fit(per_layer.iter().flatten().copied());
                vec![global; per_layer.len()]
            }
        };

        Self {
            scope,
            metric,
            scales,
        }
    }

    pub fn layer(&self, index: usize) -> Option<&RadiusScale> {
        self.scales.get(index).and_then(Option::as_ref)
    }
}

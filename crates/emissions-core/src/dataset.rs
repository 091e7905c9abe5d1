//! Ordered collection of map layers produced by a single load.

use serde::Serialize;

use crate::record::{DatasetKey, EmissionRecord, FacilityRecord, Metric};

/// Records backing one overlay layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LayerRecords {
    /// Spreadsheet sheet, one row per facility.
    Facilities(Vec<FacilityRecord>),
    /// Archive member, ranked independently by each metric.
    Ranked {
        by_emissions: Vec<EmissionRecord>,
        by_activity: Vec<EmissionRecord>,
    },
}

impl LayerRecords {
    /// Values of the collection selected by `metric`, in collection order.
    ///
    /// Facility sheets only carry tonnage, which is used for either metric.
    pub fn metric_values(&self, metric: Metric) -> Vec<f64> {
        match self {
            LayerRecords::Facilities(rows) => rows.iter().map(|row| row.tonnes_co2).collect(),
            LayerRecords::Ranked { .. } => self
                .ranked(metric)
                .iter()
                .map(|record| record.metric_value(metric))
                .collect(),
        }
    }

    /// Ranked collection for `metric`; empty for facility sheets.
    pub fn ranked(&self, metric: Metric) -> &[EmissionRecord] {
        match (self, metric) {
            (LayerRecords::Ranked { by_emissions, .. }, Metric::Emissions) => by_emissions,
            (LayerRecords::Ranked { by_activity, .. }, Metric::Activity) => by_activity,
            (LayerRecords::Facilities(_), _) => &[],
        }
    }

    pub fn len(&self, metric: Metric) -> usize {
        match self {
            LayerRecords::Facilities(rows) => rows.len(),
            LayerRecords::Ranked { .. } => self.ranked(metric).len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            LayerRecords::Facilities(rows) => rows.is_empty(),
            LayerRecords::Ranked {
                by_emissions,
                by_activity,
            } => by_emissions.is_empty() && by_activity.is_empty(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetLayer {
    pub key: DatasetKey,
    pub records: LayerRecords,
}

/// Layers keyed by `<category>-<source>`, in sheet or archive-member order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Dataset {
    layers: Vec<DatasetLayer>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer. Empty collections are dropped and a repeated key
    /// replaces the earlier layer in place.
    pub fn insert(&mut self, key: DatasetKey, records: LayerRecords) -> bool {
        if records.is_empty() {
            return false;
        }
        if let Some(existing) = self.layers.iter_mut().find(|layer| layer.key == key) {
            existing.records = records;
        } else {
            self.layers.push(DatasetLayer { key, records });
        }
        true
    }

    pub fn get(&self, key: &DatasetKey) -> Option<&LayerRecords> {
        self.layers
            .iter()
            .find(|layer| &layer.key == key)
            .map(|layer| &layer.records)
    }

    pub fn layers(&self) -> &[DatasetLayer] {
        &self.layers
    }

    pub fn keys(&self) -> impl Iterator<Item = &DatasetKey> {
        self.layers.iter().map(|layer| &layer.key)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

//! Core data model for the CO2 map: typed records, the layered dataset,
//! per-source aggregation, top-N ranking and marker radius scaling.
//!
//! Nothing here touches the filesystem; loaders live in `emissions-ingest`
//! and rendering lives in the `co2-map` binary.

pub mod aggregate;
pub mod dataset;
pub mod format;
pub mod palette;
pub mod radius;
pub mod record;

pub use aggregate::{Aggregation, DEFAULT_TOP_N, FilterStats, aggregate_year, rank, top_n};
pub use dataset::{Dataset, DatasetLayer, LayerRecords};
pub use radius::{RadiusScale, SIZE_MAX, SIZE_MIN, ScalePlan, ScaleScope};
pub use record::{DatasetKey, EmissionRecord, FacilityRecord, Metric, SourceRow};

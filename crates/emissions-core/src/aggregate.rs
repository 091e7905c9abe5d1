//! Year filtering, per-source aggregation and top-N ranking.

use std::{cmp::Ordering, collections::BTreeMap};

use chrono::Datelike;

use crate::{
    dataset::LayerRecords,
    record::{DatasetKey, EmissionRecord, Metric, SourceRow},
};

/// Default number of records kept per metric.
pub const DEFAULT_TOP_N: usize = 20;

/// Row accounting for one aggregation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub rows: usize,
    pub missing_timestamp: usize,
    pub other_year: usize,
    pub kept: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregation {
    /// One record per grouping key, ordered by key.
    pub records: Vec<EmissionRecord>,
    pub stats: FilterStats,
}

/// f64 with a total order so coordinates can take part in a map key.
#[derive(Clone, Copy, Debug)]
struct Coord(f64);

impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Coord {}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    source_id: String,
    source_name: String,
    lon: Option<Coord>,
    lat: Option<Coord>,
    activity_units: String,
    gas: String,
}

#[derive(Default)]
struct Totals {
    emissions: f64,
    activity: f64,
}

/// Keep rows whose `start_time` falls in `year` and sum emissions and
/// activity per (source_id, source_name, lon, lat, activity_units, gas).
///
/// Rows without a timestamp are dropped. Missing quantities count as zero.
pub fn aggregate_year<I>(rows: I, year: i32, key: &DatasetKey) -> Aggregation
where
    I: IntoIterator<Item = SourceRow>,
{
    let mut stats = FilterStats::default();
    let mut groups: BTreeMap<GroupKey, Totals> = BTreeMap::new();

    for row in rows {
        stats.rows += 1;
        let Some(start_time) = row.start_time else {
            stats.missing_timestamp += 1;
            continue;
        };
        if start_time.year() != year {
            stats.other_year += 1;
            continue;
        }
        stats.kept += 1;

        let totals = groups
            .entry(GroupKey {
                source_id: row.source_id,
                source_name: row.source_name,
                lon: row.lon.map(Coord),
                lat: row.lat.map(Coord),
                activity_units: row.activity_units,
                gas: row.gas,
            })
            .or_default();
        totals.emissions += row.emissions_quantity.filter(|v| v.is_finite()).unwrap_or(0.0);
        totals.activity += row.activity.filter(|v| v.is_finite()).unwrap_or(0.0);
    }

    let records = groups
        .into_iter()
        .map(|(group, totals)| EmissionRecord {
            source_id: group.source_id,
            source_name: group.source_name,
            category: key.category.clone(),
            source_label: key.source.clone(),
            longitude: group.lon.map(|c| c.0),
            latitude: group.lat.map(|c| c.0),
            emissions: totals.emissions,
            activity: totals.activity,
            gas_type: group.gas,
            activity_units: group.activity_units,
        })
        .collect();

    Aggregation { records, stats }
}

/// The `n` highest records by `metric`, sorted descending.
///
/// Ties keep their input order.
pub fn top_n(records: &[EmissionRecord], metric: Metric, n: usize) -> Vec<EmissionRecord> {
    let mut ranked: Vec<EmissionRecord> = records.to_vec();
    ranked.sort_by(|a, b| {
        b.metric_value(metric)
            .total_cmp(&a.metric_value(metric))
    });
    ranked.truncate(n);
    ranked
}

/// Rank the aggregated records independently by each metric.
pub fn rank(records: &[EmissionRecord], n: usize) -> LayerRecords {
    LayerRecords::Ranked {
        by_emissions: top_n(records, Metric::Emissions, n),
        by_activity: top_n(records, Metric::Activity, n),
    }
}

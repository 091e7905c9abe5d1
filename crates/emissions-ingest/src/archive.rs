//! Zip archive of per-source CSV files.
//!
//! Each member named `<prefix><key>_emissions_sources_v4_6_0.csv` becomes one
//! layer holding the top-N sources of the target year by emissions and by
//! activity. Members whose rows all fall outside the year are left out.

use std::io::{Read, Seek};

use emissions_core::{Dataset, DatasetKey, SourceRow, aggregate_year, rank};
use serde::Deserialize;
use tracing::{debug, info, info_span, warn};

use crate::{LoadError, LoadOptions, timestamp::parse_timestamp};

/// File name suffix identifying an emissions-sources member.
pub const MEMBER_SUFFIX: &str = "_emissions_sources_v4_6_0.csv";

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    start_time: String,
    #[serde(default)]
    source_id: String,
    #[serde(default)]
    source_name: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    lon: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    lat: Option<f64>,
    #[serde(default)]
    activity_units: String,
    #[serde(default)]
    gas: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    emissions_quantity: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    activity: Option<f64>,
}

impl From<CsvRow> for SourceRow {
    fn from(row: CsvRow) -> Self {
        SourceRow {
            start_time: parse_timestamp(&row.start_time),
            source_id: row.source_id,
            source_name: row.source_name,
            lon: row.lon.filter(|v| v.is_finite()),
            lat: row.lat.filter(|v| v.is_finite()),
            activity_units: row.activity_units,
            gas: row.gas,
            emissions_quantity: row.emissions_quantity,
            activity: row.activity,
        }
    }
}

/// Derive the dataset key of an archive member, or `None` for members that
/// are not emissions-sources files.
///
/// `prefix` is stripped from the whole member path. The category then comes
/// from the nearest remaining parent directory when there is one, otherwise
/// the stripped file name is read as `<category>-<source>`.
pub fn member_key(member: &str, prefix: &str) -> Option<DatasetKey> {
    let member = member.replace('\\', "/");
    let prefix = prefix.replace('\\', "/");
    let path = member.strip_prefix(prefix.as_str()).unwrap_or(member.as_str());
    let path = path.strip_suffix(MEMBER_SUFFIX)?;
    let (dir, stem) = match path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, path),
    };
    // A bare file prefix also applies below a directory.
    let stem = if prefix.contains('/') {
        stem
    } else {
        stem.strip_prefix(prefix.as_str()).unwrap_or(stem)
    };
    if stem.is_empty() {
        return None;
    }

    let category = dir
        .and_then(|dir| dir.rsplit('/').next())
        .filter(|category| !category.is_empty());
    Some(match category {
        Some(category) => DatasetKey::new(category, stem),
        None => DatasetKey::parse(stem),
    })
}

/// Read every emissions-sources member of the archive into a dataset.
pub fn load<R: Read + Seek>(reader: R, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut dataset = Dataset::new();

    for index in 0..archive.len() {
        let member = archive.by_index(index)?;
        if !member.is_file() {
            continue;
        }
        let name = member.name().to_string();
        let Some(key) = member_key(&name, &options.archive_prefix) else {
            debug!(member = %name, "ignoring archive member");
            continue;
        };

        let span = info_span!("load.archive", member = %name, key = %key);
        let _guard = span.enter();

        let (rows, unnamed): (Vec<SourceRow>, Vec<SourceRow>) = read_rows(member, &name)?
            .into_iter()
            .partition(|row| !row.source_id.is_empty());
        if !unnamed.is_empty() {
            metrics::counter!("co2map_rows_dropped_total", "reason" => "source_id")
                .increment(unnamed.len() as u64);
            debug!(dropped = unnamed.len(), "rows without a source_id dropped");
        }
        let aggregation = aggregate_year(rows, options.target_year, &key);
        let stats = aggregation.stats;
        if stats.missing_timestamp > 0 {
            metrics::counter!("co2map_rows_dropped_total", "reason" => "timestamp")
                .increment(stats.missing_timestamp as u64);
            debug!(
                dropped = stats.missing_timestamp,
                "rows without a parseable start_time dropped"
            );
        }

        if aggregation.records.is_empty() {
            metrics::counter!("co2map_members_skipped_total").increment(1);
            info!(
                rows = stats.rows,
                year = options.target_year,
                "no rows for target year; layer omitted"
            );
            continue;
        }

        debug!(
            rows = stats.rows,
            kept = stats.kept,
            sources = aggregation.records.len(),
            "member aggregated"
        );
        if dataset.get(&key).is_some() {
            warn!("duplicate key in archive; later member wins");
        }
        dataset.insert(key, rank(&aggregation.records, options.top_n));
    }

    Ok(dataset)
}

fn read_rows<R: Read>(reader: R, member: &str) -> Result<Vec<SourceRow>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<CsvRow>()
        .map(|row| {
            row.map(SourceRow::from).map_err(|source| LoadError::Csv {
                member: member.to_string(),
                source,
            })
        })
        .collect()
}

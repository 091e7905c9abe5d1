//! `summary` command: a plain-text overview of what a load produced.

use std::io::{self, Write};

use anyhow::Result;
use emissions_core::{
    Dataset, LayerRecords, Metric, RadiusScale,
    format::thousands,
};
use emissions_ingest::Input;

use crate::map::{config::MapConfig, pipeline::load_input};

pub(crate) fn run(config: &MapConfig) -> Result<()> {
    let dataset = load_input(Input::Path(&config.input), &config.load)?;
    let stdout = io::stdout();
    write_summary(&mut stdout.lock(), &dataset, config.metric)?;
    Ok(())
}

pub(crate) fn write_summary<W: Write>(out: &mut W, dataset: &Dataset, metric: Metric) -> io::Result<()> {
    if dataset.is_empty() {
        writeln!(out, "no layers")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<36} {:>7} {:>14} {:>14}  top",
        "layer", "records", "min", "max"
    )?;
    for layer in dataset.layers() {
        let values = layer.records.metric_values(metric);
        let (min, max) = RadiusScale::fit(values.iter().copied())
            .map(|scale| (thousands(scale.min), thousands(scale.max)))
            .unwrap_or_else(|| ("-".into(), "-".into()));
        let top = match &layer.records {
            LayerRecords::Facilities(rows) => rows
                .iter()
                .max_by(|a, b| a.tonnes_co2.total_cmp(&b.tonnes_co2))
                .map(|row| row.facility.clone()),
            LayerRecords::Ranked { .. } => layer
                .records
                .ranked(metric)
                .first()
                .map(|record| record.source_name.clone()),
        }
        .unwrap_or_default();

        writeln!(
            out,
            "{:<36} {:>7} {:>14} {:>14}  {}",
            layer.key.to_string(),
            layer.records.len(metric),
            min,
            max,
            top
        )?;
    }
    Ok(())
}

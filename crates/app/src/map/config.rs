//! Configuration parsing for the map commands.
//!
//! This module owns translation of CLI arguments (and their `CO2MAP_*`
//! environment fallbacks) into a `MapConfig` which the loader, the map
//! builder and the server use without re-parsing flags.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use emissions_core::{DEFAULT_TOP_N, Metric, ScaleScope};
use emissions_ingest::{DEFAULT_TARGET_YEAR, InputKind, LoadOptions};

/// Bundled input used when nothing else is supplied.
pub const DEFAULT_INPUT: &str = "data/data_co2_map.xlsx";
pub const DEFAULT_TITLE: &str = "CO2 Emissions Map";

#[derive(Clone, Debug, PartialEq)]
/// Initial map viewport and page title.
pub struct MapView {
    pub title: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            center_lat: -25.0,
            center_lon: 135.0,
            zoom: 4,
        }
    }
}

#[derive(Clone, Debug, Default)]
/// Optional telemetry knobs for tracing.
pub struct TelemetryOptions {
    /// Write a Chrome trace JSON file capturing load and render spans.
    pub chrome_trace_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
/// Canonical configuration shared by every command.
pub struct MapConfig {
    /// Default input file (spreadsheet or zip archive).
    pub input: PathBuf,
    /// Loader settings: target year, top-N, archive prefix and forced kind.
    pub load: LoadOptions,
    /// Metric selected when a page first opens.
    pub metric: Metric,
    /// Whether marker radii are scaled per layer or across all layers.
    pub scope: ScaleScope,
    pub view: MapView,
    pub telemetry: TelemetryOptions,
}

/// Arguments shared by `render`, `serve` and `summary`.
#[derive(Debug, Args)]
pub struct MapCliArgs {
    /// Spreadsheet (.xlsx) or zip archive of emissions-sources CSV files.
    #[arg(long, value_name = "PATH", env = "CO2MAP_INPUT", default_value = DEFAULT_INPUT)]
    pub input: PathBuf,
    /// Force the input kind instead of inferring it from the extension.
    #[arg(long, value_name = "archive|spreadsheet", env = "CO2MAP_KIND")]
    pub kind: Option<InputKind>,
    /// Year kept when filtering archive rows.
    #[arg(long, value_name = "YEAR", env = "CO2MAP_YEAR", default_value_t = DEFAULT_TARGET_YEAR)]
    pub year: i32,
    /// Sources kept per metric for archive layers.
    #[arg(long = "top-n", value_name = "N", env = "CO2MAP_TOP_N", default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,
    /// Metric shown first.
    #[arg(long, value_name = "emissions|activity", env = "CO2MAP_METRIC", default_value = "emissions")]
    pub metric: Metric,
    /// Radius scaling scope.
    #[arg(long, value_name = "per-layer|global", env = "CO2MAP_SCOPE", default_value = "per-layer")]
    pub scope: ScaleScope,
    /// Prefix stripped from archive member names.
    #[arg(long = "archive-prefix", value_name = "PREFIX", env = "CO2MAP_ARCHIVE_PREFIX", default_value = "")]
    pub archive_prefix: String,
    /// Page title.
    #[arg(long, env = "CO2MAP_TITLE", default_value = DEFAULT_TITLE)]
    pub title: String,
    /// Initial map center latitude.
    #[arg(long = "center-lat", env = "CO2MAP_CENTER_LAT", default_value_t = -25.0, allow_negative_numbers = true)]
    pub center_lat: f64,
    /// Initial map center longitude.
    #[arg(long = "center-lon", env = "CO2MAP_CENTER_LON", default_value_t = 135.0, allow_negative_numbers = true)]
    pub center_lon: f64,
    /// Initial zoom level (0-19).
    #[arg(long, env = "CO2MAP_ZOOM", default_value_t = 4)]
    pub zoom: u8,
    /// Emit Chrome trace JSON for post-mortem analysis.
    #[arg(long = "chrome-trace", value_name = "PATH")]
    pub chrome_trace: Option<PathBuf>,
}

impl TryFrom<MapCliArgs> for MapConfig {
    type Error = anyhow::Error;

    fn try_from(args: MapCliArgs) -> Result<Self> {
        if args.top_n == 0 {
            bail!("--top-n must be at least 1");
        }
        if !(1900..=2100).contains(&args.year) {
            bail!("--year must be between 1900 and 2100");
        }
        if !(-90.0..=90.0).contains(&args.center_lat) {
            bail!("--center-lat must be within [-90, 90]");
        }
        if !(-180.0..=180.0).contains(&args.center_lon) {
            bail!("--center-lon must be within [-180, 180]");
        }
        if args.zoom > 19 {
            bail!("--zoom must be between 0 and 19");
        }
        if args.title.trim().is_empty() {
            bail!("--title must not be empty");
        }

        Ok(Self {
            input: args.input,
            load: LoadOptions {
                target_year: args.year,
                top_n: args.top_n,
                archive_prefix: args.archive_prefix,
                kind: args.kind,
            },
            metric: args.metric,
            scope: args.scope,
            view: MapView {
                title: args.title,
                center_lat: args.center_lat,
                center_lon: args.center_lon,
                zoom: args.zoom,
            },
            telemetry: TelemetryOptions {
                chrome_trace_path: args.chrome_trace,
            },
        })
    }
}

impl MapConfig {
    /// File name offered for download and used to infer the default input kind.
    pub fn input_file_name(&self) -> String {
        self.input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        map: MapCliArgs,
    }

    fn parse(args: &[&str]) -> Result<MapConfig> {
        let harness = Harness::try_parse_from(std::iter::once("co2-map").chain(args.iter().copied()))?;
        MapConfig::try_from(harness.map)
    }

    #[test]
    fn defaults_match_the_bundled_dashboard() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.input, PathBuf::from(DEFAULT_INPUT));
        assert_eq!(config.load.target_year, DEFAULT_TARGET_YEAR);
        assert_eq!(config.load.top_n, 20);
        assert_eq!(config.metric, Metric::Emissions);
        assert_eq!(config.scope, ScaleScope::PerLayer);
        assert_eq!(config.view, MapView::default());
        assert_eq!(config.input_file_name(), "data_co2_map.xlsx");
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--input",
            "sources.zip",
            "--kind",
            "archive",
            "--year",
            "2023",
            "--top-n",
            "5",
            "--metric",
            "activity",
            "--scope",
            "global",
            "--center-lat",
            "-33.5",
            "--zoom",
            "6",
        ])
        .unwrap();
        assert_eq!(config.load.kind, Some(InputKind::Archive));
        assert_eq!(config.load.target_year, 2023);
        assert_eq!(config.load.top_n, 5);
        assert_eq!(config.metric, Metric::Activity);
        assert_eq!(config.scope, ScaleScope::Global);
        assert_eq!(config.view.center_lat, -33.5);
        assert_eq!(config.view.zoom, 6);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(parse(&["--top-n", "0"]).is_err());
        assert!(parse(&["--zoom", "25"]).is_err());
        assert!(parse(&["--center-lat", "-95"]).is_err());
        assert!(parse(&["--scope", "sideways"]).is_err());
        assert!(parse(&["--metric", "volume"]).is_err());
    }
}

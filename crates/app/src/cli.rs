use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::map::{self, MapCliArgs, MapConfig, ServeOptions};

/// Render interactive CO2 emissions maps from spreadsheets or source archives.
#[derive(Debug, Parser)]
#[command(name = "co2-map", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a standalone HTML map.
    Render(RenderCliArgs),
    /// Serve the map with upload and download endpoints.
    Serve(ServeCliArgs),
    /// Print a per-layer overview of the input.
    Summary(SummaryCliArgs),
}

#[derive(Debug, Args)]
pub struct RenderCliArgs {
    #[command(flatten)]
    pub map: MapCliArgs,
    /// Output HTML file.
    #[arg(short, long, value_name = "PATH", env = "CO2MAP_OUTPUT", default_value = "co2_map.html")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct ServeCliArgs {
    #[command(flatten)]
    pub map: MapCliArgs,
    /// Address to bind.
    #[arg(long, env = "CO2MAP_BIND", default_value = "0.0.0.0")]
    pub bind: String,
    /// Port to listen on.
    #[arg(long, env = "CO2MAP_PORT", default_value_t = 8080)]
    pub port: u16,
    /// Largest accepted upload, in megabytes.
    #[arg(long = "max-upload-mb", env = "CO2MAP_MAX_UPLOAD_MB", default_value_t = 64)]
    pub max_upload_mb: usize,
}

#[derive(Debug, Args)]
pub struct SummaryCliArgs {
    #[command(flatten)]
    pub map: MapCliArgs,
}

pub fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Render(args) => {
            let config = MapConfig::try_from(args.map)?;
            let _telemetry = map::install_telemetry(&config.telemetry);
            map::render_to_file(&config, &args.output)
        }
        Command::Serve(args) => {
            let config = MapConfig::try_from(args.map)?;
            let _telemetry = map::install_telemetry(&config.telemetry);
            map::serve(
                config,
                ServeOptions {
                    bind: args.bind,
                    port: args.port,
                    max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
                },
            )
        }
        Command::Summary(args) => {
            let config = MapConfig::try_from(args.map)?;
            let _telemetry = map::install_telemetry(&config.telemetry);
            map::summary::run(&config)
        }
    }
}

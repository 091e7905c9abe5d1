//! Emissions map: load a dataset, build map documents, render or serve them.
//!
//! The module is split into focused submodules:
//! - `config`: CLI configuration parsing.
//! - `document`: Markers, overlay layers and legend for one metric.
//! - `page`: Leaflet page assembly and control rendering.
//! - `pipeline`: Load-and-render passes shared by every command.
//! - `server`: Actix Web routes for the interactive page.
//! - `summary`: Plain-text per-layer overview.
//! - `telemetry`: Tracing subscriber and Prometheus recorder setup.
//! - `data`: Query structs accepted by the server.

/// Re-export configuration so callers can build runs without reaching into
/// submodules.
pub use config::{MapCliArgs, MapConfig};
pub(crate) use pipeline::render_to_file;
pub(crate) use server::{ServeOptions, serve};
pub(crate) use telemetry::install as install_telemetry;

mod config;
mod data;
mod document;
mod page;
mod pipeline;
mod server;
pub(crate) mod summary;
mod telemetry;

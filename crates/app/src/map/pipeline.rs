//! Load-and-render passes shared by the CLI commands and the server.
//!
//! Each pass loads a dataset, builds fresh map documents and returns them;
//! nothing is cached between passes.

use std::path::Path;

use anyhow::{Context, Result};
use emissions_core::{Dataset, Metric, ScaleScope};
use emissions_ingest::{Input, LoadOptions, load_dataset};
use tracing::info;

use crate::map::{
    config::MapConfig,
    page::{MapPage, ServerControls, render_page},
};

/// Load a dataset, attaching the input name to any error.
pub(crate) fn load_input(input: Input<'_>, options: &LoadOptions) -> Result<Dataset> {
    let name = match input {
        Input::Path(path) => path.display().to_string(),
        Input::Upload { name, .. } => name.to_string(),
    };
    load_dataset(input, options).with_context(|| format!("Failed to load {name}"))
}

/// Build the page for an already-loaded dataset and render it to HTML.
pub(crate) fn render_dataset(
    config: &MapConfig,
    dataset: &Dataset,
    metric: Metric,
    scope: ScaleScope,
    controls: Option<ServerControls>,
) -> Result<(MapPage, String)> {
    let mut page = MapPage::build(dataset, &config.view, metric, scope);
    if let Some(controls) = controls {
        page = page.with_controls(controls);
    }
    let html = render_page(&page)?;
    Ok((page, html))
}

/// `render` command: write a standalone page for the configured input.
pub(crate) fn render_to_file(config: &MapConfig, output: &Path) -> Result<()> {
    let dataset = load_input(Input::Path(&config.input), &config.load)?;
    let (page, html) = render_dataset(config, &dataset, config.metric, config.scope, None)?;

    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(output, html).with_context(|| format!("Failed to write {}", output.display()))?;

    let markers = page
        .document(page.selected)
        .map(|doc| doc.marker_count())
        .unwrap_or_default();
    info!(
        output = %output.display(),
        layers = dataset.len(),
        markers,
        "map written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use emissions_core::DatasetKey;

    use super::*;
    use crate::map::config::{MapView, TelemetryOptions};

    fn bundled(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data").join(name)
    }

    fn config(input: PathBuf) -> MapConfig {
        MapConfig {
            input,
            load: LoadOptions::default(),
            metric: Metric::Emissions,
            scope: ScaleScope::PerLayer,
            view: MapView::default(),
            telemetry: TelemetryOptions::default(),
        }
    }

    #[test]
    fn bundled_spreadsheet_loads_every_sheet() {
        let config = config(bundled("data_co2_map.xlsx"));
        let dataset = load_input(Input::Path(&config.input), &config.load).unwrap();
        let keys: Vec<String> = dataset.keys().map(|key| key.to_string()).collect();
        assert_eq!(
            keys,
            ["power-coal", "industry-cement", "industry-steel", "waste-landfill"]
        );
        let landfill = dataset.get(&DatasetKey::parse("waste-landfill")).unwrap();
        assert_eq!(landfill.len(Metric::Emissions), 2);
    }

    #[test]
    fn bundled_archive_uses_directory_categories() {
        let config = config(bundled("sample_sources.zip"));
        let dataset = load_input(Input::Path(&config.input), &config.load).unwrap();
        let power = dataset
            .get(&DatasetKey::new("power", "electricity-generation"))
            .unwrap();
        assert_eq!(power.len(Metric::Activity), 4);
        let top = &power.ranked(Metric::Emissions)[0];
        assert_eq!(top.source_name, "Loy Yang A");
        assert_eq!(top.emissions, 16_900_000.0);
    }

    #[test]
    fn render_writes_standalone_page() {
        let config = config(bundled("data_co2_map.xlsx"));
        let output = std::env::temp_dir()
            .join(format!("co2-map-{}", std::process::id()))
            .join("map.html");
        render_to_file(&config, &output).unwrap();
        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("<title>CO2 Emissions Map</title>"));
        assert!(html.contains("Eraring Power Station"));
        assert!(!html.contains(r#"<form id="upload-form""#));
        let _ = std::fs::remove_dir_all(output.parent().unwrap());
    }

    #[test]
    fn missing_input_names_the_file() {
        let config = config(bundled("absent.xlsx"));
        let err = load_input(Input::Path(&config.input), &config.load).unwrap_err();
        assert!(format!("{err:#}").contains("absent.xlsx"));
    }
}

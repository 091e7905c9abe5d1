//! Assembles the Leaflet page around one or more map documents.

use anyhow::{Context, Result};
use emissions_core::{
    Dataset, LayerRecords, Metric, ScaleScope,
    format::escape_html,
};
use serde::Serialize;

use crate::{
    html::leaflet::MAP_PAGE_HTML,
    map::{
        config::MapView,
        document::{MapDocument, build_map},
    },
};

/// Upload, scope and download controls shown when the page is served.
#[derive(Clone, Debug)]
pub(crate) struct ServerControls {
    pub(crate) scope: ScaleScope,
    /// File name of the bundled default input offered at `/download`.
    pub(crate) download_name: String,
    /// Name of the file the page was rendered from.
    pub(crate) source_name: String,
}

#[derive(Serialize)]
struct Payload<'a> {
    selected: Metric,
    documents: &'a [MapDocument],
}

/// Everything the page needs: one document per selectable metric.
#[derive(Clone, Debug)]
pub(crate) struct MapPage {
    pub(crate) title: String,
    pub(crate) selected: Metric,
    pub(crate) documents: Vec<MapDocument>,
    pub(crate) controls: Option<ServerControls>,
}

impl MapPage {
    /// Build the documents for `dataset`. Both metrics are offered only when
    /// the dataset has ranked (archive) layers; facility sheets carry tonnage
    /// alone.
    pub(crate) fn build(dataset: &Dataset, view: &MapView, selected: Metric, scope: ScaleScope) -> Self {
        let has_ranked = dataset
            .layers()
            .iter()
            .any(|layer| matches!(layer.records, LayerRecords::Ranked { .. }));

        let (selected, metrics) = if has_ranked {
            (selected, Metric::ALL.to_vec())
        } else {
            (Metric::Emissions, vec![Metric::Emissions])
        };

        let documents = metrics
            .into_iter()
            .map(|metric| build_map(dataset, view, metric, scope))
            .collect();

        Self {
            title: view.title.clone(),
            selected,
            documents,
            controls: None,
        }
    }

    pub(crate) fn with_controls(mut self, controls: ServerControls) -> Self {
        self.controls = Some(controls);
        self
    }

    pub(crate) fn document(&self, metric: Metric) -> Option<&MapDocument> {
        self.documents.iter().find(|doc| doc.metric == metric)
    }
}

/// Render the standalone HTML page.
pub(crate) fn render_page(page: &MapPage) -> Result<String> {
    let payload = serde_json::to_string(&Payload {
        selected: page.selected,
        documents: &page.documents,
    })
    .context("Failed to serialise map documents")?;
    // Keep `</script>` inside user text from closing the payload element.
    let payload = payload.replace("</", "<\\/");

    let title = escape_html(&page.title);
    let controls = render_controls(page);
    Ok(fill_template(
        MAP_PAGE_HTML,
        &[
            ("__TITLE__", title.as_str()),
            ("__CONTROLS__", controls.as_str()),
            ("__MAP_PAYLOAD__", payload.as_str()),
        ],
    ))
}

/// Substitute placeholders in one pass over `template`; inserted text is
/// never scanned again.
fn fill_template(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = slots
            .iter()
            .filter_map(|(placeholder, value)| {
                rest.find(placeholder).map(|at| (at, *placeholder, *value))
            })
            .min_by_key(|(at, ..)| *at);
        let Some((at, placeholder, value)) = next else {
            break;
        };
        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + placeholder.len()..];
    }
    out.push_str(rest);
    out
}

fn render_controls(page: &MapPage) -> String {
    let mut html = String::new();

    if page.documents.len() > 1 {
        html.push_str(r#"<div class="controls"><span>Metric:</span>"#);
        for doc in &page.documents {
            let checked = if doc.metric == page.selected { " checked" } else { "" };
            let label = match doc.metric {
                Metric::Emissions => "Emissions",
                Metric::Activity => "Activity",
            };
            html.push_str(&format!(
                r#"<label><input type="radio" name="metric" value="{}"{checked}> {label}</label>"#,
                doc.metric
            ));
        }
        html.push_str("</div>");
    }

    if let Some(controls) = &page.controls {
        html.push_str(r#"<form id="upload-form" class="controls">"#);
        html.push_str(r#"<input type="file" name="file" accept=".xlsx,.xlsm,.xls,.ods,.zip">"#);
        html.push_str(r#"<select name="scope">"#);
        for (scope, label) in [
            (ScaleScope::PerLayer, "Per-layer scale"),
            (ScaleScope::Global, "Global scale"),
        ] {
            let selected = if scope == controls.scope { " selected" } else { "" };
            html.push_str(&format!(
                r#"<option value="{scope}"{selected}>{label}</option>"#
            ));
        }
        html.push_str(r#"</select><button type="submit">Render</button>"#);
        html.push_str(&format!(
            r#"<a href="/download">Download {}</a></form>"#,
            escape_html(&controls.download_name)
        ));
        html.push_str(&format!(
            r#"<span class="source">Source: {}</span>"#,
            escape_html(&controls.source_name)
        ));
    }

    html
}

#[cfg(test)]
mod tests {
    use emissions_core::{DatasetKey, EmissionRecord, FacilityRecord, rank};

    use super::*;

    fn spreadsheet() -> Dataset {
        let mut dataset = Dataset::new();
        dataset.insert(
            DatasetKey::parse("power-coal"),
            LayerRecords::Facilities(vec![FacilityRecord {
                facility: "</script><script>alert(1)</script>".into(),
                owner: "Owner".into(),
                tonnes_co2: 10.0,
                biogenic: "No".into(),
                latitude: Some(-30.0),
                longitude: Some(150.0),
            }]),
        );
        dataset
    }

    fn archive() -> Dataset {
        let record = EmissionRecord {
            source_id: "1".into(),
            source_name: "Plant".into(),
            category: "power".into(),
            source_label: "coal".into(),
            longitude: Some(150.0),
            latitude: Some(-30.0),
            emissions: 10.0,
            activity: 3.0,
            gas_type: "co2".into(),
            activity_units: "MWh".into(),
        };
        let mut dataset = Dataset::new();
        dataset.insert(DatasetKey::parse("power-coal"), rank(&[record], 20));
        dataset
    }

    #[test]
    fn spreadsheet_page_has_single_metric() {
        let page = MapPage::build(
            &spreadsheet(),
            &MapView::default(),
            Metric::Activity,
            ScaleScope::PerLayer,
        );
        assert_eq!(page.documents.len(), 1);
        assert_eq!(page.selected, Metric::Emissions);

        let html = render_page(&page).unwrap();
        assert!(html.contains("<title>CO2 Emissions Map</title>"));
        assert!(!html.contains(r#"<input type="radio" name="metric""#));
        assert!(!html.contains(r#"<form id="upload-form""#));
        assert!(!html.contains("</script><script>alert"));
    }

    #[test]
    fn archive_page_offers_both_metrics() {
        let page = MapPage::build(
            &archive(),
            &MapView::default(),
            Metric::Activity,
            ScaleScope::Global,
        )
        .with_controls(ServerControls {
            scope: ScaleScope::Global,
            download_name: "sources.zip".into(),
            source_name: "upload.zip".into(),
        });
        assert!(page.document(Metric::Emissions).is_some());
        assert!(page.document(Metric::Activity).is_some());

        let html = render_page(&page).unwrap();
        assert!(html.contains(r#"value="activity" checked"#));
        assert!(html.contains(r#"<option value="global" selected>"#));
        assert!(html.contains("Download sources.zip"));
        assert!(html.contains(r#""selected":"activity""#));
        assert!(!html.contains("__MAP_PAYLOAD__"));
    }

    #[test]
    fn placeholder_text_in_names_stays_literal() {
        let view = MapView {
            title: "__CONTROLS__ map".into(),
            ..MapView::default()
        };
        let page = MapPage::build(&archive(), &view, Metric::Emissions, ScaleScope::PerLayer)
            .with_controls(ServerControls {
                scope: ScaleScope::PerLayer,
                download_name: "sources.zip".into(),
                source_name: "__MAP_PAYLOAD__.zip".into(),
            });

        let html = render_page(&page).unwrap();
        assert!(html.contains("<title>__CONTROLS__ map</title>"));
        assert!(html.contains(r#"<span class="source">Source: __MAP_PAYLOAD__.zip</span>"#));
        assert_eq!(html.matches(r#""documents":"#).count(), 1);
    }

    #[test]
    fn template_fill_is_single_pass() {
        let filled = fill_template("<a>X</a><b>Y</b>", &[("X", "Y"), ("Y", "X")]);
        assert_eq!(filled, "<a>Y</a><b>X</b>");
    }
}

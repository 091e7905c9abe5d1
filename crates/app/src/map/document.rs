//! Serialisable map description built from a dataset.
//!
//! A `MapDocument` is a plain value: every request or command builds a fresh
//! one from the dataset it just loaded, and the HTML page consumes it as JSON.

use emissions_core::{
    Dataset, DatasetKey, EmissionRecord, FacilityRecord, LayerRecords, Metric, RadiusScale,
    ScalePlan, ScaleScope,
    format::{escape_html, thousands},
    palette::color_for,
};
use serde::Serialize;
use tracing::debug;

use crate::map::config::MapView;

/// Fill opacity applied to every circle marker.
pub(crate) const FILL_OPACITY: f64 = 0.6;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Marker {
    pub(crate) lat: f64,
    pub(crate) lon: f64,
    pub(crate) radius: f64,
    /// HTML fragment.
    pub(crate) tooltip: String,
    /// HTML fragment.
    pub(crate) popup: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct OverlayLayer {
    /// Escaped layer label shown in the layer control.
    pub(crate) name: String,
    pub(crate) color: &'static str,
    pub(crate) fill_opacity: f64,
    pub(crate) scale: Option<RadiusScale>,
    pub(crate) markers: Vec<Marker>,
    /// Records that drove scaling but have no coordinates to draw.
    pub(crate) skipped_without_location: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct LegendEntry {
    pub(crate) label: String,
    pub(crate) color: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct MapDocument {
    pub(crate) title: String,
    pub(crate) center: [f64; 2],
    pub(crate) zoom: u8,
    pub(crate) metric: Metric,
    pub(crate) scope: ScaleScope,
    pub(crate) layers: Vec<OverlayLayer>,
    pub(crate) legend: Vec<LegendEntry>,
}

impl MapDocument {
    pub(crate) fn marker_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.markers.len()).sum()
    }
}

/// Build the overlay layers, markers and legend for `dataset`.
pub(crate) fn build_map(
    dataset: &Dataset,
    view: &MapView,
    metric: Metric,
    scope: ScaleScope,
) -> MapDocument {
    let _span = tracing::info_span!("map.build", %metric, %scope, layers = dataset.len()).entered();
    let plan = ScalePlan::build(dataset, metric, scope);

    let layers: Vec<OverlayLayer> = dataset
        .layers()
        .iter()
        .enumerate()
        .map(|(index, layer)| {
            let color = color_for(index);
            let scale = plan.layer(index).copied();
            let (markers, skipped) = match &layer.records {
                LayerRecords::Facilities(rows) => collect_markers(
                    rows.iter()
                        .map(|row| (row.location(), row.tonnes_co2, facility_text(&layer.key, row))),
                    scale,
                ),
                LayerRecords::Ranked { .. } => collect_markers(
                    layer.records.ranked(metric).iter().map(|record| {
                        (
                            record.location(),
                            record.metric_value(metric),
                            record_text(&layer.key, record, metric),
                        )
                    }),
                    scale,
                ),
            };
            if skipped > 0 {
                debug!(layer = %layer.key, skipped, "records without coordinates not drawn");
            }
            OverlayLayer {
                name: escape_html(&layer.key.label()),
                color,
                fill_opacity: FILL_OPACITY,
                scale,
                markers,
                skipped_without_location: skipped,
            }
        })
        .collect();

    let legend = layers
        .iter()
        .map(|layer| LegendEntry {
            label: layer.name.clone(),
            color: layer.color,
        })
        .collect();

    let document = MapDocument {
        title: view.title.clone(),
        center: [view.center_lat, view.center_lon],
        zoom: view.zoom,
        metric,
        scope,
        layers,
        legend,
    };
    metrics::counter!("co2map_markers_rendered_total").increment(document.marker_count() as u64);
    document
}

fn collect_markers<I>(items: I, scale: Option<RadiusScale>) -> (Vec<Marker>, usize)
where
    I: Iterator<Item = (Option<(f64, f64)>, f64, (String, String))>,
{
    let mut markers = Vec::new();
    let mut skipped = 0;
    for (location, value, (tooltip, popup)) in items {
        let Some((lat, lon)) = location else {
            skipped += 1;
            continue;
        };
        let radius = scale.map_or(emissions_core::SIZE_MIN, |scale| scale.radius(value));
        markers.push(Marker {
            lat,
            lon,
            radius,
            tooltip,
            popup,
        });
    }
    (markers, skipped)
}

/// Tooltip and popup for a spreadsheet facility row.
fn facility_text(key: &DatasetKey, row: &FacilityRecord) -> (String, String) {
    let tonnes = thousands(row.tonnes_co2);
    let tooltip = format!("{} — {tonnes} tCO₂", escape_html(&key.label()));
    let popup = format!(
        "<b>Facility:</b> {}<br><b>Company / Owner:</b> {}<br><b>Tonnes CO2:</b> {tonnes} tCO₂<br><b>Biogenic ?:</b> {}<br>",
        escape_html(&row.facility),
        escape_html(&row.owner),
        escape_html(&row.biogenic),
    );
    (tooltip, popup)
}

fn metric_unit(record: &EmissionRecord, metric: Metric) -> String {
    match metric {
        Metric::Emissions if record.gas_type.is_empty() => "t".to_string(),
        Metric::Emissions => format!("t {}", record.gas_type),
        Metric::Activity => record.activity_units.clone(),
    }
}

/// Tooltip and popup for an aggregated archive record.
fn record_text(key: &DatasetKey, record: &EmissionRecord, metric: Metric) -> (String, String) {
    let value = thousands(record.metric_value(metric));
    let unit = escape_html(&metric_unit(record, metric));
    let name = if record.source_name.is_empty() {
        &record.source_id
    } else {
        &record.source_name
    };
    let tooltip = format!("{} — {value} {unit}", escape_html(name)).trim_end().to_string();
    let popup = format!(
        "<b>Source:</b> {}<br><b>Source id:</b> {}<br><b>Category:</b> {}<br>\
<b>Emissions:</b> {} {}<br><b>Activity:</b> {} {}<br><b>Gas:</b> {}<br>",
        escape_html(name),
        escape_html(&record.source_id),
        escape_html(&key.label()),
        thousands(record.emissions),
        escape_html(&metric_unit(record, Metric::Emissions)),
        thousands(record.activity),
        escape_html(&record.activity_units),
        escape_html(&record.gas_type),
    );
    (tooltip, popup)
}

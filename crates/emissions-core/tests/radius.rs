use emissions_core::{
    Dataset, DatasetKey, EmissionRecord, FacilityRecord, LayerRecords, Metric, RadiusScale,
    SIZE_MAX, SIZE_MIN, ScalePlan, ScaleScope, rank,
};

fn facility(tonnes: f64) -> FacilityRecord {
    FacilityRecord {
        facility: format!("plant {tonnes}"),
        owner: "Owner".into(),
        tonnes_co2: tonnes,
        biogenic: "No".into(),
        latitude: Some(-25.0),
        longitude: Some(135.0),
    }
}

#[test]
fn endpoints_map_to_size_range() {
    let values = [120.0, 5_000.0, 37.5, 980.0];
    let scale = RadiusScale::fit(values).expect("non-empty");
    assert_eq!(scale.radius(37.5), SIZE_MIN);
    assert_eq!(scale.radius(5_000.0), SIZE_MAX);
}

#[test]
fn radius_is_monotonic() {
    let values: Vec<f64> = (0..50).map(|i| (i * i) as f64 * 3.7).collect();
    let scale = RadiusScale::fit(values.iter().copied()).unwrap();
    let radii: Vec<f64> = values.iter().map(|&v| scale.radius(v)).collect();
    for pair in radii.windows(2) {
        assert!(pair[0] <= pair[1], "{} > {}", pair[0], pair[1]);
    }
    for r in &radii {
        assert!((SIZE_MIN..=SIZE_MAX).contains(r), "radius {r} out of range");
    }
}

#[test]
fn single_distinct_value_gives_constant_radius() {
    let scale = RadiusScale::fit([7.0, 7.0, 7.0]).unwrap();
    let radii: Vec<f64> = [7.0, 7.0, 7.0].iter().map(|&v| scale.radius(v)).collect();
    assert!(radii.iter().all(|&r| r == radii[0]));
    assert!(radii[0].is_finite());
}

#[test]
fn empty_collection_has_no_scale() {
    assert!(RadiusScale::fit(Vec::<f64>::new()).is_none());
}

fn source(id: &str, emissions: f64, activity: f64) -> EmissionRecord {
    EmissionRecord {
        source_id: id.into(),
        source_name: format!("source {id}"),
        category: "power".into(),
        source_label: "coal".into(),
        longitude: Some(135.0),
        latitude: Some(-25.0),
        emissions,
        activity,
        gas_type: "co2".into(),
        activity_units: "MWh".into(),
    }
}

#[test]
fn global_scope_spans_ranked_layers_by_metric() {
    let mut dataset = Dataset::new();
    dataset.insert(
        DatasetKey::parse("power-coal"),
        rank(&[source("p1", 100.0, 5.0), source("p2", 50.0, 40.0)], 1),
    );
    dataset.insert(
        DatasetKey::parse("industry-cement"),
        rank(&[source("c1", 300.0, 2.0), source("c2", 10.0, 80.0)], 1),
    );

    let activity = ScalePlan::build(&dataset, Metric::Activity, ScaleScope::Global);
    assert_eq!(activity.layer(0), activity.layer(1));
    let shared = activity.layer(1).unwrap();
    assert_eq!((shared.min, shared.max), (40.0, 80.0));
    assert_eq!(shared.radius(40.0), SIZE_MIN);
    assert_eq!(shared.radius(80.0), SIZE_MAX);

    let emissions = ScalePlan::build(&dataset, Metric::Emissions, ScaleScope::Global);
    let shared = emissions.layer(0).unwrap();
    assert_eq!((shared.min, shared.max), (100.0, 300.0));
}

#[test]
fn per_layer_and_global_scopes_differ() {
    let mut dataset = Dataset::new();
    dataset.insert(
        DatasetKey::parse("power-coal"),
        LayerRecords::Facilities(vec![facility(10.0), facility(20.0)]),
    );
    dataset.insert(
        DatasetKey::parse("industry-cement"),
        LayerRecords::Facilities(vec![facility(100.0), facility(200.0)]),
    );

    let per_layer = ScalePlan::build(&dataset, Metric::Emissions, ScaleScope::PerLayer);
    let coal = per_layer.layer(0).unwrap();
    let cement = per_layer.layer(1).unwrap();
    assert_eq!(coal.radius(10.0), SIZE_MIN);
    assert_eq!(coal.radius(20.0), SIZE_MAX);
    assert_eq!(cement.radius(100.0), SIZE_MIN);
    assert_eq!(cement.radius(200.0), SIZE_MAX);

    let global = ScalePlan::build(&dataset, Metric::Emissions, ScaleScope::Global);
    assert_eq!(global.layer(0), global.layer(1));
    let shared = global.layer(0).unwrap();
    assert_eq!((shared.min, shared.max), (10.0, 200.0));
    assert_eq!(shared.radius(10.0), SIZE_MIN);
    assert!(shared.radius(20.0) < 2.0);
    assert_eq!(shared.radius(200.0), SIZE_MAX);
}

#[test]
fn plan_has_no_scale_past_last_layer() {
    let plan = ScalePlan::build(&Dataset::new(), Metric::Activity, ScaleScope::Global);
    assert!(plan.layer(0).is_none());
}

//! Round-trip integration tests: construct, persist, reload, and check
//! that the reloaded model evaluates identically.

use lca_core::model::{AxisKey, FunctionalUnit, Impact, Lambda, Model, ModelFileError, TOTAL_AXIS};
use lca_core::params::{Param, ParamRegistry, ParamValue};
use lca_core::Expr;
use std::collections::BTreeMap;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("lca-core-{}-{}.json", std::process::id(), name))
}

fn overrides<const N: usize>(pairs: [(&str, ParamValue); N]) -> BTreeMap<String, ParamValue> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// A miniature wind-farm model exercising every node and parameter
/// kind: floats, a bool gating a conditional, an enum with one-hot
/// branches, a power term, and an axis split with an unassigned case.
fn wind_farm_model() -> Model {
    let params = ParamRegistry::new([
        Param::float("n_turbines", 60.0, 1.0, 100.0)
            .with_unit("turbines")
            .with_group("1. Global wind farm"),
        Param::float("turbine_MW", 8.0, 5.0, 15.0)
            .with_unit("MW")
            .with_group("1. Global wind farm"),
        Param::float("load_rate", 0.4, 0.0, 1.0).with_group("1. Global wind farm"),
        Param::float("life_time", 25.0, 20.0, 30.0).with_unit("years"),
        Param::boolean("fixed_foundations", true),
        Param::enumerated("foundations_type", ["gbf", "monopod", "jacket"], "jacket"),
    ])
    .unwrap();

    // Per-turbine manufacturing impact depends on the foundation
    // choice; the floating variant carries an extra mooring term.
    let per_turbine = Expr::sum(vec![
        Expr::param("foundations_type_gbf") * Expr::lit(1200.0),
        Expr::param("foundations_type_monopod") * Expr::lit(950.0),
        Expr::param("foundations_type_jacket") * Expr::lit(1100.0),
        Expr::cond(
            Expr::param("fixed_foundations"),
            Expr::lit(0.0),
            Expr::lit(400.0),
        ),
    ]);
    let farm_total = Expr::param("n_turbines") * per_turbine;
    // Cabling scales superlinearly with farm size.
    let cabling = Expr::pow(Expr::param("n_turbines"), Expr::lit(1.5)) * Expr::lit(3.0);

    let mut total = BTreeMap::new();
    total.insert(
        "climate_change".to_string(),
        Lambda::scalar(farm_total.clone() + cabling.clone()),
    );

    let mut by_system = BTreeMap::new();
    by_system.insert(
        "climate_change".to_string(),
        Lambda::axis_split([
            (AxisKey::named("turbines"), farm_total),
            (AxisKey::Unassigned, cabling),
        ]),
    );

    let mut expressions = BTreeMap::new();
    expressions.insert(TOTAL_AXIS.to_string(), total);
    expressions.insert("system_1".to_string(), by_system);

    let mut impacts = BTreeMap::new();
    impacts.insert(
        "climate_change".to_string(),
        Impact::new("global warming potential (GWP100)", "kgCO2eq"),
    );

    let energy = Expr::param("load_rate")
        * Expr::lit(8760.0)
        * Expr::param("turbine_MW")
        * Expr::lit(1000.0)
        * Expr::param("n_turbines")
        * Expr::param("life_time");
    let mut functional_units = BTreeMap::new();
    functional_units.insert(
        "energy".to_string(),
        FunctionalUnit::new(Lambda::scalar(energy), Some("kWh")),
    );
    functional_units.insert(
        "power".to_string(),
        FunctionalUnit::new(
            Lambda::scalar(Expr::param("turbine_MW") * Expr::param("n_turbines")),
            Some("MW"),
        ),
    );
    functional_units.insert(
        "system".to_string(),
        FunctionalUnit::new(Lambda::scalar(Expr::lit(1.0)), None),
    );

    Model::new(params, functional_units, impacts, expressions).unwrap()
}

#[test]
fn test_file_roundtrip_evaluates_identically() {
    let model = wind_farm_model();
    let path = temp_path("roundtrip");
    model.to_file(&path).unwrap();
    let reloaded = Model::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let override_sets = [
        overrides([]),
        overrides([("n_turbines", 3.0.into())]),
        overrides([
            ("n_turbines", 30.0.into()),
            ("fixed_foundations", false.into()),
            ("foundations_type", "gbf".into()),
        ]),
        overrides([("load_rate", 0.55.into()), ("turbine_MW", 12.0.into())]),
    ];

    for over in &override_sets {
        for fu in ["energy", "power", "system"] {
            for axis in [None, Some(TOTAL_AXIS), Some("system_1")] {
                let before = model.evaluate("climate_change", fu, axis, over).unwrap();
                let after = reloaded.evaluate("climate_change", fu, axis, over).unwrap();
                assert_eq!(before, after, "fu={} axis={:?}", fu, axis);
            }
        }
    }
}

#[test]
fn test_json_roundtrip_preserves_document() {
    let model = wind_farm_model();
    let json = model.to_json().unwrap();
    let reloaded = Model::from_json(&json).unwrap();
    assert_eq!(reloaded.to_json().unwrap(), json);
}

#[test]
fn test_axis_split_sums_to_total_after_reload() {
    let model = wind_farm_model();
    let reloaded = Model::from_json(&model.to_json().unwrap()).unwrap();

    let over = overrides([("n_turbines", 12.0.into())]);
    let split = reloaded
        .evaluate("climate_change", "energy", Some("system_1"), &over)
        .unwrap();
    let total = reloaded
        .evaluate("climate_change", "energy", None, &over)
        .unwrap();

    let diff = split.value.total() - total.value.as_scalar().unwrap();
    assert!(diff.abs() < 1e-9);
}

#[test]
fn test_load_rejects_dangling_reference() {
    let model = wind_farm_model();
    // Corrupt the document: rename a declared parameter so the
    // expressions reference a ghost.
    let json = model
        .to_json()
        .unwrap()
        .replace("\"n_turbines\": {", "\"n_turbines_renamed\": {");

    match Model::from_json(&json) {
        Err(ModelFileError::Structural(_)) => {}
        other => panic!("expected a structural error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_load_rejects_unknown_node_tag() {
    let model = wind_farm_model();
    let json = model.to_json().unwrap().replace("\"op\": \"pow\"", "\"op\": \"integral\"");

    match Model::from_json(&json) {
        Err(ModelFileError::Malformed(_)) => {}
        other => panic!("expected a malformed-document error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_from_file_missing_path_is_io_error() {
    let err = Model::from_file(temp_path("does-not-exist")).unwrap_err();
    assert!(matches!(err, ModelFileError::Io(_)));
}

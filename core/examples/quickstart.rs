//! Build a small wind-farm model, persist it, reload it and query it —
//! the full export/consume cycle in one binary.
//!
//!     cargo run --example quickstart

use lca_core::model::{AxisKey, FunctionalUnit, Impact, Lambda, Model, TOTAL_AXIS};
use lca_core::params::{Param, ParamRegistry, ParamValue};
use lca_core::Expr;
use std::collections::BTreeMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let params = ParamRegistry::new([
        Param::float("n_turbines", 60.0, 1.0, 100.0)
            .with_unit("turbines")
            .with_group("1. Global wind farm")
            .with_label("number of wind turbines in the farm"),
        Param::float("turbine_MW", 8.0, 5.0, 15.0)
            .with_unit("MW")
            .with_group("1. Global wind farm"),
        Param::float("load_rate", 0.4, 0.0, 1.0).with_group("1. Global wind farm"),
        Param::float("life_time", 25.0, 20.0, 30.0).with_unit("years"),
        Param::enumerated("foundations_type", ["gbf", "monopod", "jacket"], "jacket"),
    ])?;

    // Impact formulas, as the symbolic pipeline would hand them over.
    let per_turbine = Expr::sum(vec![
        Expr::param("foundations_type_gbf") * Expr::lit(1200.0),
        Expr::param("foundations_type_monopod") * Expr::lit(950.0),
        Expr::param("foundations_type_jacket") * Expr::lit(1100.0),
    ]);
    let turbines = Expr::param("n_turbines") * per_turbine;
    let cabling = Expr::pow(Expr::param("n_turbines"), Expr::lit(1.5)) * Expr::lit(3.0);

    let mut total = BTreeMap::new();
    total.insert(
        "climate_change".to_string(),
        Lambda::scalar(turbines.clone() + cabling.clone()),
    );
    let mut by_system = BTreeMap::new();
    by_system.insert(
        "climate_change".to_string(),
        Lambda::axis_split([
            (AxisKey::named("turbines"), turbines),
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

    // Functional-unit formulas can be written as plain text.
    let energy = lca_core::expr::parse(
        "load_rate * 8760 * turbine_MW * 1000 * n_turbines * life_time",
    )?;
    let mut functional_units = BTreeMap::new();
    functional_units.insert(
        "energy".to_string(),
        FunctionalUnit::new(Lambda::scalar(energy), Some("kWh")),
    );
    functional_units.insert(
        "system".to_string(),
        FunctionalUnit::new(Lambda::scalar(Expr::lit(1.0)), None),
    );

    let model = Model::new(params, functional_units, impacts, expressions)?;

    // Persist and reload, as the export pipeline and app would.
    let path = std::env::temp_dir().join("quickstart-model.json");
    model.to_file(&path)?;
    let model = Model::from_file(&path)?;
    println!("model written to {}", path.display());

    let defaults = model.evaluate("climate_change", "energy", None, &BTreeMap::new())?;
    println!(
        "defaults:      {:?} {}",
        defaults.value.as_scalar(),
        defaults.unit()
    );

    let mut over: BTreeMap<String, ParamValue> = BTreeMap::new();
    over.insert("n_turbines".to_string(), 3.0.into());
    over.insert("foundations_type".to_string(), "gbf".into());
    let small_farm = model.evaluate("climate_change", "energy", None, &over)?;
    println!(
        "3-turbine gbf: {:?} {}",
        small_farm.value.as_scalar(),
        small_farm.unit()
    );

    let split = model.evaluate("climate_change", "system", Some("system_1"), &over)?;
    if let lca_core::LambdaValue::PerAxis(values) = &split.value {
        for (key, value) in values {
            println!("  {:<12} {:.1} {}", key.to_string(), value, split.unit());
        }
        println!("  {:<12} {:.1} {}", "Total", split.value.total(), split.unit());
    }

    Ok(())
}

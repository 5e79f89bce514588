//! The plans shipped under `plans/` load, resolve and solve.

use jif_config::{load_plan, resolve_system};
use std::path::PathBuf;

fn plans_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../plans")
}

#[test]
fn shipped_plans_solve() {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(plans_dir())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();
    assert_eq!(paths.len(), 3);

    for path in paths {
        let plan = load_plan(&path).unwrap();
        let mut system = resolve_system(&plan).unwrap();
        let config = system
            .solve(&plan.solve_options())
            .unwrap_or_else(|e| panic!("{}: {e}", path.display()));
        for role in ["clock", "converter", "fpga"] {
            assert!(config[role].is_object(), "{}: no {role} section", path.display());
        }
    }
}

#[test]
fn rx_plan_selects_quick_mode() {
    let plan = load_plan(&plans_dir().join("ad9081_rx_zcu102.toml")).unwrap();
    let mut system = resolve_system(&plan).unwrap();
    let config = system.solve(&plan.solve_options()).unwrap();
    assert_eq!(config["fpga"]["links"]["ad9081_rx"]["lane_rate"], 2_457_600_000i64);
}

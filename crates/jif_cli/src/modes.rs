//! `jif modes`: list a converter's quick-configuration modes.

use jif_converter::{load_converter, mode_table, Direction};
use jif_model::JesdClass;
use jif_solver::SolverKind;
use serde_json::{Map, Value};

use crate::{ClassFilter, GlobalArgs, ModesArgs, ReportFormat};

/// Runs the `jif modes` command.
pub fn run(args: &ModesArgs, _global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let directions = directions(&args.device)?;
    let classes: Vec<JesdClass> = match args.class {
        Some(ClassFilter::Jesd204B) => vec![JesdClass::Jesd204B],
        Some(ClassFilter::Jesd204C) => vec![JesdClass::Jesd204C],
        None => JesdClass::ALL.to_vec(),
    };
    match args.format {
        ReportFormat::Text => print!("{}", render_text(&directions, &classes)?),
        ReportFormat::Json => {
            let listing = list_modes(&directions, &classes)?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
    }
    Ok(0)
}

/// The datapaths a converter part exposes.
fn directions(device: &str) -> Result<Vec<Direction>, Box<dyn std::error::Error>> {
    let converter = load_converter(device, SolverKind::Intermediate)?;
    Ok(match converter.name() {
        "ad9081_rx" => vec![Direction::Rx],
        "ad9081_tx" => vec![Direction::Tx],
        _ => vec![Direction::Rx, Direction::Tx],
    })
}

/// Modes keyed by direction, then class, then mode id.
fn list_modes(
    directions: &[Direction],
    classes: &[JesdClass],
) -> Result<Value, Box<dyn std::error::Error>> {
    let table = mode_table()?;
    let mut by_direction = Map::new();
    for &direction in directions {
        let mut by_class = Map::new();
        for &class in classes {
            let modes: Map<String, Value> = table
                .modes(direction, class)
                .into_iter()
                .map(|(id, params)| (id.to_string(), params.to_json()))
                .collect();
            by_class.insert(class.name().to_string(), Value::Object(modes));
        }
        by_direction.insert(direction.name().to_string(), Value::Object(by_class));
    }
    Ok(Value::Object(by_direction))
}

fn render_text(
    directions: &[Direction],
    classes: &[JesdClass],
) -> Result<String, Box<dyn std::error::Error>> {
    let table = mode_table()?;
    let mut out = String::new();
    for &direction in directions {
        for &class in classes {
            out.push_str(&format!("{direction} {class}\n"));
            out.push_str("  mode   M   L   N  Np   F   S   K   E\n");
            for (id, p) in table.modes(direction, class) {
                out.push_str(&format!(
                    "  {id:>4}{:>4}{:>4}{:>4}{:>4}{:>4}{:>4}{:>4}{:>4}\n",
                    p.m, p.l, p.n, p.np, p.f, p.s, p.k, p.e
                ));
            }
        }
    }
    Ok(out)
}

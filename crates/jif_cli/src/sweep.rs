//! `jif sweep`: solve one plan at several sample rates.
//!
//! Every rate gets its own resolved system and solve session, so the points
//! run in parallel on the rayon pool. The quick-configuration tables are the
//! only state they share, read-only.

use jif_common::{rational_to_json, Frequency};
use jif_config::{load_plan, PlanConfig};
use jif_solver::SolveOptions;
use rayon::prelude::*;
use serde_json::{json, Value};
use tracing::debug;

use crate::solve::solve_plan;
use crate::{GlobalArgs, ReportFormat, SweepArgs};

/// Outcome of one sweep point.
#[derive(Debug)]
pub struct SweepPoint {
    /// The sample rate applied to every datapath.
    pub sample_rate: Frequency,
    /// The solved configuration, or the reason there is none.
    pub result: Result<Value, String>,
}

impl SweepPoint {
    fn to_json(&self) -> Value {
        let rate = rational_to_json(&self.sample_rate.rational());
        match &self.result {
            Ok(config) => json!({ "sample_rate": rate, "status": "solved", "config": config }),
            Err(error) => json!({ "sample_rate": rate, "status": "failed", "error": error }),
        }
    }
}

/// Runs the `jif sweep` command.
///
/// Returns exit code 0 when at least one rate solved, 1 otherwise.
pub fn run(args: &SweepArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let plan = load_plan(&args.plan)?;
    if !global.quiet {
        eprintln!(
            "   Sweeping {} over {} sample rates",
            plan.system.converter,
            args.sample_rates.len()
        );
    }

    let points = sweep(&plan, &args.sample_rates, &args.plan);

    match args.format {
        ReportFormat::Text => print!("{}", render_text(&points)),
        ReportFormat::Json => {
            let rows: Vec<Value> = points.iter().map(SweepPoint::to_json).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    let solved = points.iter().filter(|p| p.result.is_ok()).count();
    if !global.quiet {
        eprintln!("   {solved} of {} sample rates solved", points.len());
    }
    Ok(if solved > 0 { 0 } else { 1 })
}

/// Solves `plan` at each rate in parallel, keeping the input order.
pub fn sweep(plan: &PlanConfig, rates: &[Frequency], source: &std::path::Path) -> Vec<SweepPoint> {
    let options: SolveOptions = plan.solve_options();
    rates
        .par_iter()
        .map(|&sample_rate| {
            let point = plan.with_sample_clock(sample_rate);
            let result = solve_plan(&point, &options, source).map_err(|e| e.to_string());
            debug!(%sample_rate, solved = result.is_ok(), "sweep point finished");
            SweepPoint {
                sample_rate,
                result,
            }
        })
        .collect()
}

fn render_text(points: &[SweepPoint]) -> String {
    let mut out = String::new();
    for point in points {
        let line = match &point.result {
            Ok(config) => format!("solved (clock vco {})", config["clock"]["vco"]),
            Err(error) => format!("failed: {error}"),
        };
        out.push_str(&format!("{:>14}  {line}\n", point.sample_rate.to_string()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use jif_config::load_plan_from_str;
    use std::path::Path;

    const PLAN: &str = r#"
[system]
vcxo = "122.88MHz"
converter = "ad9081_rx"

[converter]
decimation = 12
"#;

    fn rates(values: &[&str]) -> Vec<Frequency> {
        values.iter().map(|v| v.parse().unwrap()).collect()
    }

    #[test]
    fn points_keep_input_order() {
        let plan = load_plan_from_str(PLAN).unwrap();
        let points = sweep(&plan, &rates(&["122.88MHz", "61.44MHz"]), Path::new("jif.toml"));
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].sample_rate.to_string(), "122.88MHz");
        assert_eq!(points[1].sample_rate.to_string(), "61.44MHz");
        let config = points[0].result.as_ref().unwrap();
        assert_eq!(config["converter"]["sample_clock"], 122_880_000);
    }

    #[test]
    fn failures_are_reported_per_point() {
        let plan = load_plan_from_str(PLAN).unwrap();
        let points = sweep(&plan, &rates(&["122.88MHz", "1GHz"]), Path::new("jif.toml"));
        assert!(points[0].result.is_ok());
        assert!(points[1].result.is_err());
        assert_eq!(points[1].to_json()["status"], "failed");
        assert_eq!(points[0].to_json()["status"], "solved");
    }

    #[test]
    fn text_has_a_row_per_point() {
        let plan = load_plan_from_str(PLAN).unwrap();
        let points = sweep(&plan, &rates(&["122.88MHz"]), Path::new("jif.toml"));
        let text = render_text(&points);
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("122.88MHz  solved"), "{text}");
    }
}

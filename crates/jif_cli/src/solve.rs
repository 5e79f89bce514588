//! `jif solve`: solve one system plan.

use std::path::Path;

use jif_config::{load_plan, resolve_system, ConfigError, PlanConfig};
use jif_solver::SolveOptions;
use serde_json::Value;
use tracing::info;

use crate::report::render_config;
use crate::{GlobalArgs, ReportFormat, SolveArgs};

/// Runs the `jif solve` command.
///
/// Prints the solved configuration and returns exit code 0. Infeasible or
/// aborted plans surface as errors.
pub fn run(args: &SolveArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    if global.verbose {
        eprintln!("    Reading {}", args.plan.display());
    }
    let plan = load_plan(&args.plan)?;
    if !global.quiet {
        eprintln!(
            "   Solving {} + {} + {} ({} solver)",
            plan.system.converter, plan.system.clock, plan.system.fpga, plan.system.solver
        );
    }

    let mut options = plan.solve_options();
    if args.timeout_ms.is_some() {
        options.timeout_ms = args.timeout_ms;
    }
    let config = solve_plan(&plan, &options, &args.plan)?;

    match args.format {
        ReportFormat::Text => print!("{}", render_config(&config)),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(0)
}

/// Resolves and solves a plan in its own solve session.
pub fn solve_plan(
    plan: &PlanConfig,
    options: &SolveOptions,
    source: &Path,
) -> Result<Value, ConfigError> {
    let mut system = resolve_system(plan)?;
    let config = system.solve(options)?;
    info!(plan = %source.display(), converter = %plan.system.converter, "plan solved");
    Ok(config)
}

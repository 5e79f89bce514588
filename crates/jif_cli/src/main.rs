//! jif CLI: JESD204 clock-tree planning from the command line.
//!
//! Provides `jif solve` for solving one system plan, `jif modes` for listing
//! a converter's quick-configuration modes, and `jif sweep` for solving a
//! plan across several sample rates in parallel.

#![warn(missing_docs)]

mod modes;
mod report;
mod solve;
mod sweep;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use jif_common::Frequency;
use tracing_subscriber::EnvFilter;

/// jif: clock-tree planning for JESD204 converter systems.
#[derive(Parser, Debug)]
#[command(name = "jif", version, about = "JESD204 clock-tree planner")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Solve the clock tree of a system plan.
    Solve(SolveArgs),
    /// List a converter's quick-configuration modes.
    Modes(ModesArgs),
    /// Solve a plan at several sample rates.
    Sweep(SweepArgs),
}

/// Arguments for the `jif solve` subcommand.
#[derive(Parser, Debug)]
pub struct SolveArgs {
    /// Path to the `jif.toml` plan.
    pub plan: PathBuf,

    /// Output format for the solved configuration.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Override the plan's solver time limit, in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Arguments for the `jif modes` subcommand.
#[derive(Parser, Debug)]
pub struct ModesArgs {
    /// Converter part name (e.g. `ad9081_rx`).
    pub device: String,

    /// Only list modes of this JESD204 class.
    #[arg(long, value_enum)]
    pub class: Option<ClassFilter>,

    /// Output format for the mode listing.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `jif sweep` subcommand.
#[derive(Parser, Debug)]
pub struct SweepArgs {
    /// Path to the `jif.toml` plan.
    pub plan: PathBuf,

    /// Sample rates to try (e.g. `122.88MHz 245.76MHz`).
    #[arg(long = "sample-rate", required = true, num_args = 1..)]
    pub sample_rates: Vec<Frequency>,

    /// Output format for the sweep table.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Result output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// JESD204 class selection for `jif modes`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ClassFilter {
    /// 8b10b links.
    #[value(name = "jesd204b")]
    Jesd204B,
    /// 64b66b links.
    #[value(name = "jesd204c")]
    Jesd204C,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    let result = match cli.command {
        Command::Solve(ref args) => solve::run(args, &global),
        Command::Modes(ref args) => modes::run(args, &global),
        Command::Sweep(ref args) => sweep::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Log filter for the given flags; `RUST_LOG` applies only without them.
fn log_filter(quiet: bool, verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

fn init_logging(quiet: bool, verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(quiet, verbose))
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_solve_default() {
        let cli = Cli::parse_from(["jif", "solve", "jif.toml"]);
        match cli.command {
            Command::Solve(ref args) => {
                assert_eq!(args.plan, PathBuf::from("jif.toml"));
                assert_eq!(args.format, ReportFormat::Text);
                assert!(args.timeout_ms.is_none());
            }
            _ => panic!("expected Solve command"),
        }
    }

    #[test]
    fn parse_solve_with_args() {
        let cli = Cli::parse_from([
            "jif",
            "solve",
            "plans/zcu102.toml",
            "--format",
            "json",
            "--timeout-ms",
            "1000",
        ]);
        match cli.command {
            Command::Solve(ref args) => {
                assert_eq!(args.plan, PathBuf::from("plans/zcu102.toml"));
                assert_eq!(args.format, ReportFormat::Json);
                assert_eq!(args.timeout_ms, Some(1000));
            }
            _ => panic!("expected Solve command"),
        }
    }

    #[test]
    fn parse_modes() {
        let cli = Cli::parse_from(["jif", "modes", "ad9081_tx", "--class", "jesd204c"]);
        match cli.command {
            Command::Modes(ref args) => {
                assert_eq!(args.device, "ad9081_tx");
                assert_eq!(args.class, Some(ClassFilter::Jesd204C));
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Modes command"),
        }
    }

    #[test]
    fn parse_sweep_rates() {
        let cli = Cli::parse_from([
            "jif",
            "sweep",
            "jif.toml",
            "--sample-rate",
            "122.88MHz",
            "245.76MHz",
        ]);
        match cli.command {
            Command::Sweep(ref args) => {
                let rates: Vec<String> =
                    args.sample_rates.iter().map(ToString::to_string).collect();
                assert_eq!(rates, vec!["122.88MHz", "245.76MHz"]);
            }
            _ => panic!("expected Sweep command"),
        }
    }

    #[test]
    fn sweep_requires_a_rate() {
        assert!(Cli::try_parse_from(["jif", "sweep", "jif.toml"]).is_err());
    }

    #[test]
    fn sweep_rejects_bad_rate() {
        let args = ["jif", "sweep", "jif.toml", "--sample-rate", "fast"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["jif", "--quiet", "modes", "ad9081"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        let cli = Cli::parse_from(["jif", "modes", "ad9081", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn flags_override_env_filter() {
        assert_eq!(log_filter(false, true).to_string(), "debug");
        assert_eq!(log_filter(true, false).to_string(), "error");
    }
}

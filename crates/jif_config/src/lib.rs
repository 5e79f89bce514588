//! Parsing, validation and resolution of `jif.toml` system plans.
//!
//! A plan names a converter, a clock chip and an FPGA board, carries their
//! settings, and picks the solver backend. [`load_plan`] produces a
//! strongly-typed [`PlanConfig`]; [`resolve_system`] turns it into a
//! configured [`jif_system::DynSystem`] ready to solve.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_plan, load_plan_from_str};
pub use resolve::resolve_system;
pub use types::*;

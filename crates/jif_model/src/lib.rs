//! Device model contract for clock-tree planning.
//!
//! Converters, clock chips and FPGAs implement [`Device`] (plus one of
//! [`Converter`], [`ClockChip`] or [`Fpga`]) against the solver-agnostic
//! [`jif_solver::Backend`] interface. This crate also carries the pieces every
//! device model shares: configuration [`Namespace`]s, range and set checks,
//! JESD204 link arithmetic, and the [`ModelError`] taxonomy.

#![warn(missing_docs)]

pub mod checks;
pub mod device;
pub mod error;
pub mod jesd;
pub mod namespace;

pub use checks::{check_in_set, check_rate, constrain_range, intersect};
pub use device::{solve_model, ClockChip, ClockRequest, Converter, Device, Fpga};
pub use error::ModelError;
pub use jesd::{JesdClass, JesdLink, JesdParams};
pub use namespace::Namespace;

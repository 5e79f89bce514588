//! Solver-agnostic modelling layer for clock-tree planning.
//!
//! Device models declare decision variables with discrete domains, build
//! derived quantities with ordinary arithmetic on [`Expr`], and register
//! [`Constraint`]s against a [`Backend`]. Two interchangeable backends are
//! provided: [`IntermediateBackend`] keeps derived quantities as named
//! nodes, while [`SubstitutionBackend`] inlines them and lowers discrete sets
//! to index lookups. Both hand the finished problem to the Z3 SMT solver.

#![warn(missing_docs)]

pub mod backend;
pub mod domain;
pub mod error;
pub mod expr;
pub mod ids;
pub mod intermediate;
mod registry;
mod smt;
pub mod substitution;

pub use backend::{
    new_backend, Backend, ModelState, SolveOptions, SolveReport, SolveStatus, SolverKind,
    VariableInfo,
};
pub use domain::Domain;
pub use error::SolverError;
pub use expr::{Constraint, Env, Expr, Relation};
pub use ids::{NodeId, VarId};
pub use intermediate::IntermediateBackend;
pub use substitution::SubstitutionBackend;

//! The backend interface every device model is written against.
//!
//! A [`Backend`] owns one solve session: the variables, intermediate
//! quantities and constraints registered while configuring, and the
//! assignment produced by [`Backend::solve`]. Device models never branch on
//! which backend is active; they only call this trait.
//!
//! Registrations are grouped in scopes. Reopening a scope retires whatever
//! it registered before, so a device can rebuild its part of a shared model
//! without leaving stale variables or constraints behind.

use crate::domain::Domain;
use crate::error::SolverError;
use crate::expr::{Constraint, Expr};
use crate::intermediate::IntermediateBackend;
use crate::substitution::SubstitutionBackend;
use jif_common::Rational;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Selects one of the available backend implementations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Derived quantities are named intermediate nodes; discrete sets are native.
    Intermediate,
    /// Derived quantities are inlined formulas; discrete sets become index lookups.
    Substitution,
}

impl SolverKind {
    /// Every supported backend.
    pub const ALL: [SolverKind; 2] = [SolverKind::Intermediate, SolverKind::Substitution];

    /// Returns the canonical tag for this backend.
    pub fn name(self) -> &'static str {
        match self {
            SolverKind::Intermediate => "intermediate",
            SolverKind::Substitution => "substitution",
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolverKind {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "intermediate" => Ok(SolverKind::Intermediate),
            "substitution" => Ok(SolverKind::Substitution),
            _ => Err(SolverError::UnknownSolver(s.to_string())),
        }
    }
}

/// Lifecycle state of a backend model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelState {
    /// Variables and constraints may be registered.
    Configuring,
    /// A feasible assignment is available.
    Solved,
    /// The solver proved no assignment exists.
    Infeasible,
    /// The solver stopped before reaching a verdict.
    Aborted,
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelState::Configuring => "configuring",
            ModelState::Solved => "solved",
            ModelState::Infeasible => "infeasible",
            ModelState::Aborted => "aborted",
        })
    }
}

/// Terminal outcome of [`Backend::solve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStatus {
    /// An assignment satisfying every constraint was found.
    Feasible,
    /// No assignment satisfies the constraints.
    Infeasible,
    /// The solver answered `unknown` (time budget spent, or the problem is
    /// beyond its decision procedures).
    Aborted,
}

/// Options handed to the solver engine, untouched by device models.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveOptions {
    /// Wall-clock budget in milliseconds. `None` lets the solver run to a verdict.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl SolveOptions {
    /// Options with a time budget.
    pub fn with_timeout_ms(timeout_ms: u64) -> Self {
        Self {
            timeout_ms: Some(timeout_ms),
        }
    }
}

/// What the solver engine reported for the last solve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolveReport {
    /// Time spent inside the solver.
    pub elapsed: Duration,
    /// The solver's explanation when it answered `unknown`.
    pub reason_unknown: Option<String>,
}

/// A summary of one registered variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableInfo {
    /// The scoped variable name.
    pub name: String,
    /// Number of values the variable may take; `None` for a continuous range.
    pub domain_size: Option<usize>,
}

/// The variable/expression/constraint interface over a solve session.
pub trait Backend: fmt::Debug {
    /// Returns which implementation this is.
    fn kind(&self) -> SolverKind;

    /// Returns the current lifecycle state.
    fn state(&self) -> ModelState;

    /// Makes `scope` own every registration that follows.
    ///
    /// Variables, intermediates and constraints `scope` registered earlier
    /// are retired first, together with any constraint elsewhere that refers
    /// to them. Expressions built from retired entities are rejected with
    /// [`SolverError::UnknownReference`].
    fn open_scope(&mut self, scope: &str) -> Result<(), SolverError>;

    /// Creates a decision variable with the given domain.
    ///
    /// # Errors
    ///
    /// [`SolverError::UnsupportedDomain`] if the backend cannot represent the
    /// domain, [`SolverError::EmptyDomain`] if it has no values, and
    /// [`SolverError::ConstraintRegistration`] outside the configuring state.
    fn make_variable(&mut self, name: &str, domain: &Domain) -> Result<Expr, SolverError>;

    /// Registers a derived quantity and returns the expression that stands for it.
    fn make_derived(&mut self, name: &str, expr: Expr) -> Result<Expr, SolverError>;

    /// Registers a constraint against the active session.
    fn add_constraint(&mut self, constraint: Constraint) -> Result<(), SolverError>;

    /// Registers several constraints.
    fn add_constraints(&mut self, constraints: Vec<Constraint>) -> Result<(), SolverError> {
        for constraint in constraints {
            self.add_constraint(constraint)?;
        }
        Ok(())
    }

    /// Returns the number of registered decision variables.
    fn variable_count(&self) -> usize;

    /// Returns the number of registered constraints.
    fn constraint_count(&self) -> usize;

    /// Describes every registered decision variable.
    fn variables(&self) -> Vec<VariableInfo>;

    /// Hands the registered problem to the solver engine.
    ///
    /// Moves the model out of the configuring state. Solving again without a
    /// [`reset`](Backend::reset) returns the previous status.
    fn solve(&mut self, options: &SolveOptions) -> Result<SolveStatus, SolverError>;

    /// The solver engine's report on the last solve, if one ran.
    fn last_report(&self) -> Option<SolveReport>;

    /// Evaluates an expression under the solution.
    ///
    /// # Errors
    ///
    /// [`SolverError::NotSolved`] unless the last solve was feasible.
    fn value(&self, expr: &Expr) -> Result<Rational, SolverError>;

    /// Discards every registration and any solution.
    fn reset(&mut self);
}

/// Creates an empty backend of the given kind.
pub fn new_backend(kind: SolverKind) -> Box<dyn Backend> {
    match kind {
        SolverKind::Intermediate => Box::new(IntermediateBackend::new()),
        SolverKind::Substitution => Box::new(SubstitutionBackend::new()),
    }
}

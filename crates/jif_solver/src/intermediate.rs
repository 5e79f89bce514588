//! Backend that keeps derived quantities as named intermediate nodes.
//!
//! Discrete sets become native variables constrained to the set's values,
//! continuous ranges become real-valued variables, and every
//! [`Backend::make_derived`] call registers a node that the solver sees as
//! its own real-valued unknown tied to its formula.

use crate::backend::{
    Backend, ModelState, SolveOptions, SolveReport, SolveStatus, SolverKind, VariableInfo,
};
use crate::domain::Domain;
use crate::error::SolverError;
use crate::expr::{Constraint, Expr};
use crate::registry::Registry;
use jif_common::Rational;

/// Intermediate-node backend.
#[derive(Debug)]
pub struct IntermediateBackend {
    registry: Registry,
}

impl IntermediateBackend {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    /// Returns the number of registered intermediate nodes.
    pub fn intermediate_count(&self) -> usize {
        self.registry.node_count()
    }
}

impl Default for IntermediateBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for IntermediateBackend {
    fn kind(&self) -> SolverKind {
        SolverKind::Intermediate
    }

    fn state(&self) -> ModelState {
        self.registry.state()
    }

    fn open_scope(&mut self, scope: &str) -> Result<(), SolverError> {
        self.registry.open_scope(scope)
    }

    fn make_variable(&mut self, name: &str, domain: &Domain) -> Result<Expr, SolverError> {
        self.registry.ensure_configuring("a variable")?;
        let bounds = domain.normalize(name)?;
        let id = self.registry.add_variable(name, bounds)?;
        Ok(Expr::Var(id))
    }

    fn make_derived(&mut self, name: &str, expr: Expr) -> Result<Expr, SolverError> {
        let id = self.registry.add_node(name, expr)?;
        Ok(Expr::Node(id))
    }

    fn add_constraint(&mut self, constraint: Constraint) -> Result<(), SolverError> {
        self.registry.add_constraint(constraint)
    }

    fn variable_count(&self) -> usize {
        self.registry.variable_count()
    }

    fn constraint_count(&self) -> usize {
        self.registry.constraint_count()
    }

    fn variables(&self) -> Vec<VariableInfo> {
        self.registry.variables()
    }

    fn solve(&mut self, options: &SolveOptions) -> Result<SolveStatus, SolverError> {
        self.registry.solve(SolverKind::Intermediate, options)
    }

    fn last_report(&self) -> Option<SolveReport> {
        self.registry.report()
    }

    fn value(&self, expr: &Expr) -> Result<Rational, SolverError> {
        self.registry.value(expr)
    }

    fn reset(&mut self) {
        self.registry.reset();
    }
}

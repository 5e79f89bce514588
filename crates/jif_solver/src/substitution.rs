//! Backend that inlines derived quantities and lowers sets to lookups.
//!
//! [`Backend::make_derived`] hands the formula straight back, so every use
//! site carries the full expression. A discrete [`Domain::Set`] is replaced
//! by an integer index variable over `0..n` and a lookup table holding the
//! set's values; integer ranges stay native. Every unknown the solver sees is
//! an integer, so continuous ranges are rejected.

use crate::backend::{
    Backend, ModelState, SolveOptions, SolveReport, SolveStatus, SolverKind, VariableInfo,
};
use crate::domain::{Bounds, Domain};
use crate::error::SolverError;
use crate::expr::{Constraint, Expr};
use crate::registry::Registry;
use jif_common::Rational;
use std::sync::Arc;

/// Formula-substitution backend.
#[derive(Debug)]
pub struct SubstitutionBackend {
    registry: Registry,
}

impl SubstitutionBackend {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }
}

impl Default for SubstitutionBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for SubstitutionBackend {
    fn kind(&self) -> SolverKind {
        SolverKind::Substitution
    }

    fn state(&self) -> ModelState {
        self.registry.state()
    }

    fn open_scope(&mut self, scope: &str) -> Result<(), SolverError> {
        self.registry.open_scope(scope)
    }

    fn make_variable(&mut self, name: &str, domain: &Domain) -> Result<Expr, SolverError> {
        self.registry.ensure_configuring("a variable")?;
        let values = match domain.normalize(name)? {
            Bounds::Values(values) => values,
            Bounds::Interval { .. } => {
                return Err(SolverError::UnsupportedDomain {
                    backend: SolverKind::Substitution,
                    variable: name.to_string(),
                    reason: "continuous ranges have no integer lowering".to_string(),
                });
            }
            integers => {
                let id = self.registry.add_variable(name, integers)?;
                return Ok(Expr::Var(id));
            }
        };

        let index = self.registry.add_variable(
            name,
            Bounds::Integers {
                min: 0,
                max: values.len() as i128 - 1,
            },
        )?;
        Ok(Expr::Lookup {
            index,
            table: Arc::from(values),
        })
    }

    fn make_derived(&mut self, _name: &str, expr: Expr) -> Result<Expr, SolverError> {
        self.registry.ensure_configuring("an intermediate")?;
        self.registry.check_references(&expr)?;
        Ok(expr)
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
        self.registry.solve(SolverKind::Substitution, options)
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

//! Registration bookkeeping shared by the backend implementations.
//!
//! Variables and intermediates live in arenas addressed by [`VarId`] and
//! [`NodeId`]. Retiring a scope marks its entries dead instead of removing
//! them, so ids held by other scopes stay valid.

use crate::backend::{ModelState, SolveOptions, SolveReport, SolveStatus, SolverKind, VariableInfo};
use crate::domain::Bounds;
use crate::error::SolverError;
use crate::expr::{Constraint, Env, Expr};
use crate::ids::{NodeId, VarId};
use crate::smt::{self, Declared, Defined, Problem, Verdict};
use jif_common::Rational;

#[derive(Debug)]
struct Variable {
    name: String,
    bounds: Bounds,
    owner: Option<usize>,
    live: bool,
}

#[derive(Debug)]
struct Node {
    name: String,
    owner: Option<usize>,
    live: bool,
}

#[derive(Debug)]
struct Registered {
    constraint: Constraint,
    owner: Option<usize>,
}

/// Variables, intermediates, constraints and the solution of one session.
#[derive(Debug)]
pub(crate) struct Registry {
    scopes: Vec<String>,
    active: Option<usize>,
    variables: Vec<Variable>,
    nodes: Vec<Node>,
    definitions: Vec<Expr>,
    constraints: Vec<Registered>,
    state: ModelState,
    assignment: Vec<Option<Rational>>,
    report: Option<SolveReport>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            scopes: Vec::new(),
            active: None,
            variables: Vec::new(),
            nodes: Vec::new(),
            definitions: Vec::new(),
            constraints: Vec::new(),
            state: ModelState::Configuring,
            assignment: Vec::new(),
            report: None,
        }
    }

    pub(crate) fn state(&self) -> ModelState {
        self.state
    }

    pub(crate) fn ensure_configuring(&self, what: &'static str) -> Result<(), SolverError> {
        if self.state == ModelState::Configuring {
            Ok(())
        } else {
            Err(SolverError::ConstraintRegistration {
                what,
                state: self.state,
            })
        }
    }

    /// Retires everything `scope` owns and makes it the owner of what follows.
    pub(crate) fn open_scope(&mut self, scope: &str) -> Result<(), SolverError> {
        self.ensure_configuring("a scope")?;
        let owner = match self.scopes.iter().position(|s| s == scope) {
            Some(owner) => owner,
            None => {
                self.scopes.push(scope.to_string());
                self.scopes.len() - 1
            }
        };
        self.retire(owner);
        self.active = Some(owner);
        Ok(())
    }

    fn retire(&mut self, owner: usize) {
        let mut retired = 0;
        for var in self.variables.iter_mut().filter(|v| v.live && v.owner == Some(owner)) {
            var.live = false;
            retired += 1;
        }
        // Nodes only refer to earlier entries, so one forward pass catches
        // every intermediate built on a retired one.
        for index in 0..self.nodes.len() {
            let node = &self.nodes[index];
            let stale = node.owner == Some(owner)
                || self.check_references(&self.definitions[index]).is_err();
            if node.live && stale {
                self.nodes[index].live = false;
            }
        }
        let before = self.constraints.len();
        let constraints = std::mem::take(&mut self.constraints);
        let kept: Vec<Registered> = constraints
            .into_iter()
            .filter(|c| {
                c.owner != Some(owner)
                    && self.check_references(&c.constraint.lhs).is_ok()
                    && self.check_references(&c.constraint.rhs).is_ok()
            })
            .collect();
        self.constraints = kept;
        if retired > 0 || before != self.constraints.len() {
            tracing::debug!(
                scope = %self.scopes[owner],
                variables = retired,
                constraints = before - self.constraints.len(),
                "retired scope registrations"
            );
        }
    }

    pub(crate) fn add_variable(
        &mut self,
        name: &str,
        bounds: Bounds,
    ) -> Result<VarId, SolverError> {
        self.ensure_configuring("a variable")?;
        let id = VarId::from_raw(self.variables.len() as u32);
        self.variables.push(Variable {
            name: name.to_string(),
            bounds,
            owner: self.active,
            live: true,
        });
        Ok(id)
    }

    pub(crate) fn add_node(&mut self, name: &str, expr: Expr) -> Result<NodeId, SolverError> {
        self.ensure_configuring("an intermediate")?;
        self.check_references(&expr)?;
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(Node {
            name: name.to_string(),
            owner: self.active,
            live: true,
        });
        self.definitions.push(expr);
        Ok(id)
    }

    pub(crate) fn add_constraint(&mut self, constraint: Constraint) -> Result<(), SolverError> {
        self.ensure_configuring("a constraint")?;
        self.check_references(&constraint.lhs)?;
        self.check_references(&constraint.rhs)?;
        self.constraints.push(Registered {
            constraint,
            owner: self.active,
        });
        Ok(())
    }

    /// Rejects expressions built against a different model or a retired scope.
    pub(crate) fn check_references(&self, expr: &Expr) -> Result<(), SolverError> {
        match expr {
            Expr::Const(_) => Ok(()),
            Expr::Var(id) | Expr::Lookup { index: id, .. } => {
                match self.variables.get(id.index()) {
                    Some(var) if var.live => Ok(()),
                    _ => Err(SolverError::UnknownReference(format!(
                        "variable #{}",
                        id.as_raw()
                    ))),
                }
            }
            Expr::Node(id) => match self.nodes.get(id.index()) {
                Some(node) if node.live => Ok(()),
                _ => Err(SolverError::UnknownReference(format!(
                    "intermediate #{}",
                    id.as_raw()
                ))),
            },
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                self.check_references(a)?;
                self.check_references(b)
            }
        }
    }

    pub(crate) fn variable_count(&self) -> usize {
        self.variables.iter().filter(|v| v.live).count()
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.live).count()
    }

    pub(crate) fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub(crate) fn variables(&self) -> Vec<VariableInfo> {
        self.variables
            .iter()
            .filter(|v| v.live)
            .map(|v| VariableInfo {
                name: v.name.clone(),
                domain_size: v.bounds.size(),
            })
            .collect()
    }

    pub(crate) fn report(&self) -> Option<SolveReport> {
        self.report.clone()
    }

    pub(crate) fn solve(
        &mut self,
        kind: SolverKind,
        options: &SolveOptions,
    ) -> Result<SolveStatus, SolverError> {
        match self.state {
            ModelState::Configuring => {}
            ModelState::Solved => return Ok(SolveStatus::Feasible),
            ModelState::Infeasible => return Ok(SolveStatus::Infeasible),
            ModelState::Aborted => return Ok(SolveStatus::Aborted),
        }

        let problem = Problem {
            variables: self
                .variables
                .iter()
                .map(|v| {
                    v.live.then_some(Declared {
                        name: &v.name,
                        bounds: &v.bounds,
                    })
                })
                .collect(),
            nodes: self
                .nodes
                .iter()
                .zip(&self.definitions)
                .map(|(n, expr)| {
                    n.live.then_some(Defined {
                        name: &n.name,
                        expr,
                    })
                })
                .collect(),
            constraints: self.constraints.iter().map(|c| &c.constraint).collect(),
        };
        let outcome = smt::check(&problem, options)?;

        let mut reason_unknown = None;
        let status = match outcome.verdict {
            Verdict::Sat(values) => {
                self.assignment = values;
                self.state = ModelState::Solved;
                SolveStatus::Feasible
            }
            Verdict::Unsat => {
                self.state = ModelState::Infeasible;
                SolveStatus::Infeasible
            }
            Verdict::Unknown(reason) => {
                reason_unknown = Some(reason);
                self.state = ModelState::Aborted;
                SolveStatus::Aborted
            }
        };
        tracing::debug!(
            backend = %kind,
            variables = self.variable_count(),
            intermediates = self.node_count(),
            constraints = self.constraints.len(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            ?status,
            "solver finished"
        );
        self.report = Some(SolveReport {
            elapsed: outcome.elapsed,
            reason_unknown,
        });
        Ok(status)
    }

    pub(crate) fn value(&self, expr: &Expr) -> Result<Rational, SolverError> {
        if self.state != ModelState::Solved {
            return Err(SolverError::NotSolved(self.state));
        }
        self.check_references(expr)?;
        let env = Env {
            values: &self.assignment,
            nodes: &self.definitions,
        };
        expr.evaluate(env).ok_or(SolverError::Undefined)
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jif_common::hz;

    fn values(list: &[i128]) -> Bounds {
        Bounds::Values(list.iter().map(|&v| hz(v)).collect())
    }

    #[test]
    fn registration_after_solve_is_rejected() {
        let mut reg = Registry::new();
        let x = reg.add_variable("x", values(&[1, 2])).unwrap();
        reg.add_constraint(Constraint::equal(Expr::Var(x), hz(2)))
            .unwrap();
        reg.solve(SolverKind::Intermediate, &SolveOptions::default())
            .unwrap();
        let err = reg
            .add_constraint(Constraint::at_least(Expr::Var(x), hz(1)))
            .unwrap_err();
        assert!(matches!(err, SolverError::ConstraintRegistration { .. }));
        assert!(reg.open_scope("dev").is_err());
    }

    #[test]
    fn foreign_reference_is_rejected() {
        let mut reg = Registry::new();
        let err = reg
            .add_constraint(Constraint::equal(Expr::Var(VarId::from_raw(3)), hz(1)))
            .unwrap_err();
        assert!(matches!(err, SolverError::UnknownReference(_)));
    }

    #[test]
    fn value_before_solve_is_not_solved() {
        let mut reg = Registry::new();
        let x = reg.add_variable("x", values(&[1])).unwrap();
        let err = reg.value(&Expr::Var(x)).unwrap_err();
        assert_eq!(err, SolverError::NotSolved(ModelState::Configuring));
    }

    #[test]
    fn reset_returns_to_configuring() {
        let mut reg = Registry::new();
        reg.add_variable("x", values(&[1])).unwrap();
        reg.solve(SolverKind::Substitution, &SolveOptions::default())
            .unwrap();
        assert_eq!(reg.state(), ModelState::Solved);
        assert!(reg.report().is_some());
        reg.reset();
        assert_eq!(reg.state(), ModelState::Configuring);
        assert_eq!(reg.variable_count(), 0);
        assert!(reg.report().is_none());
    }

    #[test]
    fn repeated_solve_returns_previous_status() {
        let mut reg = Registry::new();
        let x = reg.add_variable("x", values(&[1])).unwrap();
        reg.add_constraint(Constraint::equal(Expr::Var(x), hz(5)))
            .unwrap();
        let opts = SolveOptions::default();
        assert_eq!(
            reg.solve(SolverKind::Intermediate, &opts).unwrap(),
            SolveStatus::Infeasible
        );
        assert_eq!(
            reg.solve(SolverKind::Intermediate, &opts).unwrap(),
            SolveStatus::Infeasible
        );
    }

    #[test]
    fn reopening_a_scope_replaces_its_registrations() {
        let mut reg = Registry::new();
        reg.open_scope("dev").unwrap();
        let stale = reg.add_variable("dev.x", values(&[1, 2])).unwrap();
        reg.add_constraint(Constraint::equal(Expr::Var(stale), hz(1)))
            .unwrap();

        reg.open_scope("dev").unwrap();
        assert_eq!(reg.variable_count(), 0);
        assert_eq!(reg.constraint_count(), 0);
        let err = reg
            .add_constraint(Constraint::equal(Expr::Var(stale), hz(2)))
            .unwrap_err();
        assert!(matches!(err, SolverError::UnknownReference(_)));

        let x = reg.add_variable("dev.x", values(&[1, 2])).unwrap();
        reg.add_constraint(Constraint::equal(Expr::Var(x), hz(2)))
            .unwrap();
        assert_eq!(
            reg.solve(SolverKind::Intermediate, &SolveOptions::default())
                .unwrap(),
            SolveStatus::Feasible
        );
        assert_eq!(reg.value(&Expr::Var(x)).unwrap(), hz(2));
    }

    #[test]
    fn retiring_a_scope_drops_dependent_constraints() {
        let mut reg = Registry::new();
        reg.open_scope("converter").unwrap();
        let clk = reg.add_variable("converter.clk", values(&[10, 20])).unwrap();
        let half = reg.add_node("converter.half", Expr::Var(clk) / 2).unwrap();
        reg.open_scope("clock").unwrap();
        let out = reg.add_variable("clock.out", values(&[10, 20])).unwrap();
        reg.add_constraint(Constraint::equal(Expr::Var(out), Expr::Node(half) * 2))
            .unwrap();
        assert_eq!(reg.constraint_count(), 1);

        reg.open_scope("converter").unwrap();
        assert_eq!(reg.constraint_count(), 0);
        assert_eq!(reg.node_count(), 0);
        assert_eq!(reg.variable_count(), 1);
    }
}

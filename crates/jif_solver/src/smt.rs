//! Lowering of a registered problem onto the Z3 SMT solver.
//!
//! Every solve builds a fresh Z3 context. Integer-valued domains become `Int`
//! constants, other domains `Real` constants, and every expression is lowered
//! to `Real` arithmetic so rational rates stay exact. Sets become a
//! disjunction of equalities, lookups a chain of `ite` terms, and each
//! division asserts that its denominator is non-zero.

use crate::backend::SolveOptions;
use crate::domain::Bounds;
use crate::error::SolverError;
use crate::expr::{Constraint, Expr, Relation};
use jif_common::Rational;
use num_traits::Zero;
use std::time::{Duration, Instant};
use z3::ast::{Ast, Bool, Int, Real};
use z3::{Config, Context, Model, Params, SatResult, Solver};

/// A live decision variable handed to the solver.
pub(crate) struct Declared<'a> {
    pub(crate) name: &'a str,
    pub(crate) bounds: &'a Bounds,
}

/// A live intermediate node handed to the solver.
pub(crate) struct Defined<'a> {
    pub(crate) name: &'a str,
    pub(crate) expr: &'a Expr,
}

/// The live part of a registry, indexed like its arenas.
///
/// Retired entries are `None`.
pub(crate) struct Problem<'a> {
    pub(crate) variables: Vec<Option<Declared<'a>>>,
    pub(crate) nodes: Vec<Option<Defined<'a>>>,
    pub(crate) constraints: Vec<&'a Constraint>,
}

/// The solver's answer.
#[derive(Debug)]
pub(crate) enum Verdict {
    /// Satisfiable, with the value of every live variable.
    Sat(Vec<Option<Rational>>),
    /// Unsatisfiable.
    Unsat,
    /// No verdict, with the solver's reason.
    Unknown(String),
}

/// A verdict and the time the solver spent reaching it.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) verdict: Verdict,
    pub(crate) elapsed: Duration,
}

/// Lowers `problem` onto a new Z3 solver and checks it.
pub(crate) fn check(problem: &Problem<'_>, options: &SolveOptions) -> Result<Outcome, SolverError> {
    let config = Config::new();
    let ctx = Context::new(&config);
    let solver = Solver::new(&ctx);
    if let Some(timeout) = options.timeout_ms {
        let mut params = Params::new(&ctx);
        params.set_u32("timeout", u32::try_from(timeout).unwrap_or(u32::MAX));
        solver.set_params(&params);
    }

    let mut lowering = Lowering {
        ctx: &ctx,
        solver: &solver,
        variables: Vec::with_capacity(problem.variables.len()),
        nodes: Vec::with_capacity(problem.nodes.len()),
    };
    for (index, entry) in problem.variables.iter().enumerate() {
        let term = match entry {
            Some(var) => Some(lowering.declare(index, var)?),
            None => None,
        };
        lowering.variables.push(term);
    }
    for (index, entry) in problem.nodes.iter().enumerate() {
        let value = match entry {
            Some(node) => Some(lowering.define(index, node)?),
            None => None,
        };
        lowering.nodes.push(value);
    }
    for constraint in &problem.constraints {
        let relation = lowering.relation(constraint)?;
        solver.assert(&relation);
    }

    let start = Instant::now();
    let result = solver.check();
    let elapsed = start.elapsed();
    let verdict = match result {
        SatResult::Sat => {
            let model = solver
                .get_model()
                .ok_or_else(|| SolverError::Engine("satisfiable, but no model".to_string()))?;
            let values = problem
                .variables
                .iter()
                .zip(&lowering.variables)
                .map(|(entry, term)| match (entry, term) {
                    (Some(var), Some(term)) => read(&model, term).map(Some).ok_or_else(|| {
                        SolverError::Engine(format!("no rational value for '{}'", var.name))
                    }),
                    _ => Ok(None),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Verdict::Sat(values)
        }
        SatResult::Unsat => Verdict::Unsat,
        SatResult::Unknown => Verdict::Unknown(
            solver
                .get_reason_unknown()
                .unwrap_or_else(|| "unknown".to_string()),
        ),
    };
    Ok(Outcome { verdict, elapsed })
}

#[derive(Clone)]
enum Term<'ctx> {
    Int(Int<'ctx>),
    Real(Real<'ctx>),
}

impl<'ctx> Term<'ctx> {
    fn to_real(&self) -> Real<'ctx> {
        match self {
            Term::Int(x) => x.to_real(),
            Term::Real(x) => x.clone(),
        }
    }
}

struct Lowering<'ctx, 's> {
    ctx: &'ctx Context,
    solver: &'s Solver<'ctx>,
    variables: Vec<Option<Term<'ctx>>>,
    nodes: Vec<Option<Real<'ctx>>>,
}

impl<'ctx> Lowering<'ctx, '_> {
    fn declare(&self, index: usize, var: &Declared<'_>) -> Result<Term<'ctx>, SolverError> {
        let symbol = format!("{}!{index}", var.name);
        match var.bounds {
            Bounds::Values(values) if values.iter().all(Rational::is_integer) => {
                let x = Int::new_const(self.ctx, symbol);
                let choices = values
                    .iter()
                    .map(|v| Ok(x._eq(&self.int(v.to_integer())?)))
                    .collect::<Result<Vec<_>, SolverError>>()?;
                self.assert_any(&choices);
                Ok(Term::Int(x))
            }
            Bounds::Values(values) => {
                let x = Real::new_const(self.ctx, symbol);
                let choices = values
                    .iter()
                    .map(|v| Ok(x._eq(&self.real(v)?)))
                    .collect::<Result<Vec<_>, SolverError>>()?;
                self.assert_any(&choices);
                Ok(Term::Real(x))
            }
            Bounds::Integers { min, max } => {
                let x = Int::new_const(self.ctx, symbol);
                self.solver.assert(&x.ge(&self.int(*min)?));
                self.solver.assert(&x.le(&self.int(*max)?));
                Ok(Term::Int(x))
            }
            Bounds::Interval { min, max } => {
                let x = Real::new_const(self.ctx, symbol);
                self.solver.assert(&x.ge(&self.real(min)?));
                self.solver.assert(&x.le(&self.real(max)?));
                Ok(Term::Real(x))
            }
        }
    }

    fn define(&self, index: usize, node: &Defined<'_>) -> Result<Real<'ctx>, SolverError> {
        let value = Real::new_const(self.ctx, format!("{}!n{index}", node.name));
        let definition = self.lower(node.expr)?;
        self.solver.assert(&value._eq(&definition));
        Ok(value)
    }

    fn relation(&self, constraint: &Constraint) -> Result<Bool<'ctx>, SolverError> {
        let lhs = self.lower(&constraint.lhs)?;
        let rhs = self.lower(&constraint.rhs)?;
        Ok(match constraint.relation {
            Relation::Eq => lhs._eq(&rhs),
            Relation::Le => lhs.le(&rhs),
            Relation::Ge => lhs.ge(&rhs),
        })
    }

    fn lower(&self, expr: &Expr) -> Result<Real<'ctx>, SolverError> {
        Ok(match expr {
            Expr::Const(value) => self.real(value)?,
            Expr::Var(id) => self.variable(id.index())?.to_real(),
            Expr::Node(id) => self
                .nodes
                .get(id.index())
                .cloned()
                .flatten()
                .ok_or_else(|| {
                    SolverError::UnknownReference(format!("intermediate #{}", id.as_raw()))
                })?,
            Expr::Lookup { index, table } => {
                let Term::Int(position) = self.variable(index.index())? else {
                    return Err(SolverError::Engine(format!(
                        "lookup index #{} is not an integer variable",
                        index.as_raw()
                    )));
                };
                let Some((last, rest)) = table.split_last() else {
                    return Err(SolverError::Engine("empty lookup table".to_string()));
                };
                let mut picked = self.real(last)?;
                for (i, value) in rest.iter().enumerate().rev() {
                    let at = position._eq(&self.int(i as i128)?);
                    picked = at.ite(&self.real(value)?, &picked);
                }
                picked
            }
            Expr::Add(a, b) => Real::add(self.ctx, &[&self.lower(a)?, &self.lower(b)?]),
            Expr::Sub(a, b) => Real::sub(self.ctx, &[&self.lower(a)?, &self.lower(b)?]),
            Expr::Mul(a, b) => Real::mul(self.ctx, &[&self.lower(a)?, &self.lower(b)?]),
            Expr::Div(a, b) => {
                let numerator = self.lower(a)?;
                let denominator = self.lower(b)?;
                let zero = self.real(&Rational::zero())?;
                self.solver.assert(&denominator._eq(&zero).not());
                numerator.div(&denominator)
            }
        })
    }

    fn variable(&self, index: usize) -> Result<&Term<'ctx>, SolverError> {
        self.variables
            .get(index)
            .and_then(Option::as_ref)
            .ok_or_else(|| SolverError::UnknownReference(format!("variable #{index}")))
    }

    fn assert_any(&self, choices: &[Bool<'ctx>]) {
        let refs: Vec<&Bool<'ctx>> = choices.iter().collect();
        self.solver.assert(&Bool::or(self.ctx, &refs));
    }

    fn int(&self, value: i128) -> Result<Int<'ctx>, SolverError> {
        let small = i64::try_from(value).map_err(|_| {
            SolverError::Engine(format!("{value} does not fit a 64-bit numeral"))
        })?;
        Ok(Int::from_i64(self.ctx, small))
    }

    fn real(&self, value: &Rational) -> Result<Real<'ctx>, SolverError> {
        let numer = self.int(*value.numer())?.to_real();
        if value.is_integer() {
            return Ok(numer);
        }
        Ok(numer.div(&self.int(*value.denom())?.to_real()))
    }
}

fn read(model: &Model<'_>, term: &Term<'_>) -> Option<Rational> {
    match term {
        Term::Int(x) => {
            let value = model.eval(x, true)?.as_i64()?;
            Some(Rational::from_integer(i128::from(value)))
        }
        Term::Real(x) => {
            let (numer, denom) = model.eval(x, true)?.as_real()?;
            let denom = i128::from(denom);
            (denom != 0).then(|| Rational::new(i128::from(numer), denom))
        }
    }
}

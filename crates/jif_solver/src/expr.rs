//! Symbolic expressions and constraints over solver variables.
//!
//! An [`Expr`] is built by arithmetic composition of variables, intermediate
//! nodes and exact constants. Expressions are never assigned directly; they
//! are evaluated from their operands once the backend has produced a
//! solution. A [`Constraint`] relates two expressions with `==`, `<=` or `>=`.

use crate::ids::{NodeId, VarId};
use jif_common::Rational;
use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, ToPrimitive, Zero};
use std::ops;
use std::sync::Arc;

/// A symbolic arithmetic expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// An exact constant.
    Const(Rational),
    /// A decision variable.
    Var(VarId),
    /// A named intermediate quantity registered with the backend.
    Node(NodeId),
    /// `table[index]`, where `index` is an integer variable.
    Lookup {
        /// Variable selecting the table entry.
        index: VarId,
        /// The allowed values, in declaration order.
        table: Arc<[Rational]>,
    },
    /// Sum of two expressions.
    Add(Box<Expr>, Box<Expr>),
    /// Difference of two expressions.
    Sub(Box<Expr>, Box<Expr>),
    /// Product of two expressions.
    Mul(Box<Expr>, Box<Expr>),
    /// Quotient of two expressions.
    Div(Box<Expr>, Box<Expr>),
}

/// A read-only view of variable values and intermediate definitions.
///
/// Unassigned variables are `None`; expressions touching them evaluate to
/// `None` as well.
#[derive(Clone, Copy, Debug)]
pub struct Env<'a> {
    /// Current value of every variable, indexed by [`VarId`].
    pub values: &'a [Option<Rational>],
    /// Definition of every intermediate node, indexed by [`NodeId`].
    pub nodes: &'a [Expr],
}

impl Expr {
    /// Creates a constant expression.
    pub fn constant(value: Rational) -> Self {
        Expr::Const(value)
    }

    /// Returns the constant value if this expression is a literal constant.
    pub fn as_const(&self) -> Option<Rational> {
        match self {
            Expr::Const(value) => Some(*value),
            _ => None,
        }
    }

    /// Evaluates the expression with exact checked arithmetic.
    ///
    /// Returns `None` if any referenced variable is unassigned, a division by
    /// zero occurs, a lookup index is out of range, or arithmetic overflows.
    pub fn evaluate(&self, env: Env<'_>) -> Option<Rational> {
        match self {
            Expr::Const(value) => Some(*value),
            Expr::Var(id) => env.values.get(id.index()).copied().flatten(),
            Expr::Node(id) => env.nodes.get(id.index())?.evaluate(env),
            Expr::Lookup { index, table } => {
                let position = env.values.get(index.index()).copied().flatten()?;
                if !position.is_integer() {
                    return None;
                }
                let position = position.numer().to_usize()?;
                table.get(position).copied()
            }
            Expr::Add(a, b) => a.evaluate(env)?.checked_add(&b.evaluate(env)?),
            Expr::Sub(a, b) => a.evaluate(env)?.checked_sub(&b.evaluate(env)?),
            Expr::Mul(a, b) => a.evaluate(env)?.checked_mul(&b.evaluate(env)?),
            Expr::Div(a, b) => {
                let denom = b.evaluate(env)?;
                if denom.is_zero() {
                    return None;
                }
                a.evaluate(env)?.checked_div(&denom)
            }
        }
    }
}

impl From<Rational> for Expr {
    fn from(value: Rational) -> Self {
        Expr::Const(value)
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Const(Rational::from_integer(i128::from(value)))
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Const(Rational::from_integer(i128::from(value)))
    }
}

impl From<u32> for Expr {
    fn from(value: u32) -> Self {
        Expr::Const(Rational::from_integer(i128::from(value)))
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl<R: Into<Expr>> ops::$trait<R> for Expr {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::$variant(Box::new(self), Box::new(rhs.into()))
            }
        }

        impl<R: Into<Expr>> ops::$trait<R> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::$variant(Box::new(self.clone()), Box::new(rhs.into()))
            }
        }
    };
}

impl_binary_op!(Add, add, Add);
impl_binary_op!(Sub, sub, Sub);
impl_binary_op!(Mul, mul, Mul);
impl_binary_op!(Div, div, Div);

/// The comparison a constraint enforces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `lhs == rhs`
    Eq,
    /// `lhs <= rhs`
    Le,
    /// `lhs >= rhs`
    Ge,
}

impl Relation {
    /// Returns the operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Eq => "==",
            Relation::Le => "<=",
            Relation::Ge => ">=",
        }
    }
}

/// A relation between two expressions that must hold in any valid solution.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    /// Left-hand side.
    pub lhs: Expr,
    /// The comparison.
    pub relation: Relation,
    /// Right-hand side.
    pub rhs: Expr,
}

impl Constraint {
    /// `lhs == rhs`
    pub fn equal(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self {
            lhs: lhs.into(),
            relation: Relation::Eq,
            rhs: rhs.into(),
        }
    }

    /// `lhs <= rhs`
    pub fn at_most(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self {
            lhs: lhs.into(),
            relation: Relation::Le,
            rhs: rhs.into(),
        }
    }

    /// `lhs >= rhs`
    pub fn at_least(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self {
            lhs: lhs.into(),
            relation: Relation::Ge,
            rhs: rhs.into(),
        }
    }
}

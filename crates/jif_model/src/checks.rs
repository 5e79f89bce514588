//! Shared validation and range-constraint helpers.

use crate::error::ModelError;
use jif_common::{Frequency, Rational};
use jif_solver::{Backend, Constraint, Expr, SolverError};
use std::fmt::Display;

/// Fails unless `value` is one of `allowed`.
pub fn check_in_set<T>(what: &str, value: T, allowed: &[T]) -> Result<(), ModelError>
where
    T: PartialEq + Display,
{
    if allowed.contains(&value) {
        return Ok(());
    }
    let list = allowed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(ModelError::InvalidConfiguration(format!(
        "{what} {value} is not supported; allowed values are [{list}]"
    )))
}

/// Fails unless `min <= value <= max`.
pub fn check_rate(
    what: &str,
    value: Rational,
    min: Rational,
    max: Rational,
) -> Result<(), ModelError> {
    if value >= min && value <= max {
        return Ok(());
    }
    Err(ModelError::InvalidConfiguration(format!(
        "{what} {} is outside [{}, {}]",
        Frequency::new(value),
        Frequency::new(min),
        Frequency::new(max)
    )))
}

/// Registers `min <= expr <= max`.
pub fn constrain_range(
    model: &mut dyn Backend,
    expr: &Expr,
    min: Rational,
    max: Rational,
) -> Result<(), SolverError> {
    model.add_constraints(vec![
        Constraint::at_least(expr, min),
        Constraint::at_most(expr, max),
    ])
}

/// Returns the values of `a` that also appear in `b`, keeping `a`'s order.
pub fn intersect(a: &[u32], b: &[u32]) -> Vec<u32> {
    a.iter().copied().filter(|v| b.contains(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jif_common::hz;
    use jif_solver::{new_backend, Domain, SolveOptions, SolveStatus, SolverKind};

    #[test]
    fn set_membership() {
        assert!(check_in_set("decimation", 12, &[1, 2, 12]).is_ok());
        let err = check_in_set("decimation", 5, &[1, 2, 12]).unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidConfiguration(
                "decimation 5 is not supported; allowed values are [1, 2, 12]".to_string()
            )
        );
    }

    #[test]
    fn rate_bounds_are_inclusive() {
        assert!(check_rate("sample clock", hz(10), hz(10), hz(20)).is_ok());
        assert!(check_rate("sample clock", hz(20), hz(10), hz(20)).is_ok());
        let err = check_rate("sample clock", hz(21), hz(10), hz(20)).unwrap_err();
        assert!(matches!(
            err,
            ModelError::InvalidConfiguration(msg) if msg.contains("sample clock")
        ));
    }

    #[test]
    fn range_constraint_limits_solution() {
        let mut model = new_backend(SolverKind::Substitution);
        let x = model.make_variable("x", &Domain::integer_range(1, 10)).unwrap();
        constrain_range(model.as_mut(), &(&x * 3), hz(10), hz(14)).unwrap();
        assert_eq!(model.constraint_count(), 2);
        assert_eq!(model.solve(&SolveOptions::default()).unwrap(), SolveStatus::Feasible);
        assert_eq!(model.value(&x).unwrap(), hz(4));
    }

    #[test]
    fn intersection_keeps_order() {
        assert_eq!(intersect(&[4, 1, 3, 2], &[2, 3]), vec![3, 2]);
    }
}

//! Variable domains: explicit discrete sets or bounded ranges.

use crate::error::SolverError;
use jif_common::Rational;

/// The set of values a variable may take.
#[derive(Clone, Debug, PartialEq)]
pub enum Domain {
    /// An explicit finite set of allowed values, in declaration order.
    Set(Vec<Rational>),
    /// A bounded range, either integral or continuous.
    Range {
        /// Inclusive lower bound.
        min: Rational,
        /// Inclusive upper bound.
        max: Rational,
        /// Whether only integer values are allowed.
        integer: bool,
    },
}

impl Domain {
    /// A finite set of integer values.
    pub fn integers<I>(values: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        Domain::Set(
            values
                .into_iter()
                .map(|v| Rational::from_integer(i128::from(v)))
                .collect(),
        )
    }

    /// An inclusive integer range.
    pub fn integer_range(min: i64, max: i64) -> Self {
        Domain::Range {
            min: Rational::from_integer(i128::from(min)),
            max: Rational::from_integer(i128::from(max)),
            integer: true,
        }
    }

    /// An inclusive continuous range.
    pub fn continuous(min: Rational, max: Rational) -> Self {
        Domain::Range {
            min,
            max,
            integer: false,
        }
    }

    /// Returns `true` if this domain is an explicit set.
    pub fn is_set(&self) -> bool {
        matches!(self, Domain::Set(_))
    }

    /// Brings the domain into the form handed to the solver engine.
    ///
    /// Sets keep their declaration order with duplicates removed, and
    /// integer ranges are rounded inward. `variable` is only used for error
    /// messages.
    pub(crate) fn normalize(&self, variable: &str) -> Result<Bounds, SolverError> {
        let bounds = match self {
            Domain::Set(values) => {
                let mut seen = std::collections::HashSet::new();
                Bounds::Values(values.iter().copied().filter(|v| seen.insert(*v)).collect())
            }
            Domain::Range {
                min,
                max,
                integer: true,
            } => Bounds::Integers {
                min: min.ceil().to_integer(),
                max: max.floor().to_integer(),
            },
            Domain::Range { min, max, .. } => Bounds::Interval {
                min: *min,
                max: *max,
            },
        };
        if bounds.is_empty() {
            return Err(SolverError::EmptyDomain(variable.to_string()));
        }
        Ok(bounds)
    }
}

/// A normalized, non-empty domain.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Bounds {
    /// One of the listed values.
    Values(Vec<Rational>),
    /// Any integer in `min..=max`.
    Integers { min: i128, max: i128 },
    /// Any rational in `[min, max]`.
    Interval { min: Rational, max: Rational },
}

impl Bounds {
    fn is_empty(&self) -> bool {
        match self {
            Bounds::Values(values) => values.is_empty(),
            Bounds::Integers { min, max } => min > max,
            Bounds::Interval { min, max } => min > max,
        }
    }

    /// Number of allowed values, or `None` for a continuous interval.
    pub(crate) fn size(&self) -> Option<usize> {
        match self {
            Bounds::Values(values) => Some(values.len()),
            Bounds::Integers { min, max } => {
                Some(usize::try_from(max - min + 1).unwrap_or(usize::MAX))
            }
            Bounds::Interval { .. } => None,
        }
    }
}

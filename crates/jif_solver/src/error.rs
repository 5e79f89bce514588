//! Error types for model construction, constraint registration and read-back.

use crate::backend::{ModelState, SolverKind};

/// Errors raised by a solver backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolverError {
    /// The backend cannot represent the requested variable domain.
    #[error("the {backend} backend cannot represent the domain of '{variable}': {reason}")]
    UnsupportedDomain {
        /// The backend that rejected the domain.
        backend: SolverKind,
        /// The variable being created.
        variable: String,
        /// Why the domain is unsupported.
        reason: String,
    },

    /// A variable was declared with no allowed values.
    #[error("variable '{0}' has an empty domain")]
    EmptyDomain(String),

    /// An unknown backend tag was requested.
    #[error("unknown solver {0:?}. Supported: intermediate, substitution")]
    UnknownSolver(String),

    /// A variable, intermediate or constraint was registered outside the configuring state.
    #[error("cannot register {what} while the model is {state}")]
    ConstraintRegistration {
        /// What was being registered.
        what: &'static str,
        /// The state the model was in.
        state: ModelState,
    },

    /// Values were requested before a successful solve.
    #[error("no solution is available: the model is {0}")]
    NotSolved(ModelState),

    /// An expression references an entity that belongs to another model.
    #[error("expression references {0}, which is not registered with this model")]
    UnknownReference(String),

    /// An expression has no value under the solution (e.g. division by zero).
    #[error("expression is undefined under the current solution")]
    Undefined,

    /// The solver engine failed to accept the problem or to report a model.
    #[error("solver engine failure: {0}")]
    Engine(String),
}

//! Error types for device configuration, model building and solving.

use jif_solver::SolverError;

/// Errors raised by device models and the system composer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A discrete setting violates the device's allowed values or tables.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A recognized but unbuilt mode was selected.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// The complete constraint system admits no solution.
    #[error("no configuration satisfies the {constraints} constraints over {variables} variables")]
    Infeasible {
        /// Number of registered constraints.
        constraints: usize,
        /// Number of registered decision variables.
        variables: usize,
    },

    /// The solver gave up before reaching a verdict.
    #[error("solver gave up without a verdict: {reason}")]
    Aborted {
        /// The engine's explanation, e.g. `"timeout"`.
        reason: String,
    },

    /// A configuration key was read that the device never defined.
    #[error("'{key}' is not defined in the {scope} configuration")]
    MissingEntry {
        /// Namespace scope.
        scope: String,
        /// The missing key.
        key: String,
    },

    /// An error from the solver backend, propagated unchanged.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

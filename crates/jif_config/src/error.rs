//! Error types for plan loading, validation and resolution.

use jif_model::ModelError;

/// Errors that can occur when loading or resolving a `jif.toml` plan.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the plan file.
    #[error("failed to read plan: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse plan: {0}")]
    ParseError(String),

    /// A required field is missing from the plan.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A plan value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// A device part name is not supported in its role.
    #[error("unknown {role} '{name}'; supported: {supported}")]
    UnknownDevice {
        /// `converter`, `clock` or `fpga`.
        role: &'static str,
        /// The name given in the plan.
        name: String,
        /// Comma-separated supported names.
        supported: String,
    },

    /// A device rejected its settings.
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("system.vcxo".to_string());
        assert_eq!(format!("{err}"), "missing required field: system.vcxo");
    }

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected '=' at line 3".to_string());
        assert_eq!(format!("{err}"), "failed to parse plan: expected '=' at line 3");
    }

    #[test]
    fn display_validation_error() {
        let err = ConfigError::ValidationError("decimation is a receive setting".to_string());
        assert_eq!(format!("{err}"), "validation error: decimation is a receive setting");
    }

    #[test]
    fn display_unknown_device() {
        let err = ConfigError::UnknownDevice {
            role: "clock",
            name: "hmc7044".to_string(),
            supported: "ad9528".to_string(),
        };
        assert_eq!(format!("{err}"), "unknown clock 'hmc7044'; supported: ad9528");
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::IoError(io_err);
        assert!(format!("{err}").starts_with("failed to read plan:"));
    }

    #[test]
    fn model_errors_pass_through() {
        let err =
            ConfigError::from(ModelError::NotImplemented("AD9081 direct clocking".to_string()));
        assert_eq!(format!("{err}"), "not implemented: AD9081 direct clocking");
    }
}

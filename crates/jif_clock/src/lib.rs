//! Clock-generator device models.
//!
//! A clock chip receives the rates other devices request through
//! [`ClockChip::connect_outputs`] and solves for its own dividers so that
//! every output lands exactly on its request.

#![warn(missing_docs)]

pub mod ad9528;

pub use ad9528::{Ad9528, Ad9528Limits};

use jif_common::Rational;
use jif_model::{ClockChip, ModelError};
use jif_solver::SolverKind;

/// Part names accepted by [`load_clock_chip`].
pub const SUPPORTED_CLOCK_CHIPS: [&str; 1] = ["ad9528"];

/// Creates a clock-chip model by part name, driven by `vcxo`.
pub fn load_clock_chip(
    name: &str,
    solver: SolverKind,
    vcxo: Rational,
) -> Result<Box<dyn ClockChip>, ModelError> {
    match name.to_ascii_lowercase().as_str() {
        "ad9528" | "ad-9528" => Ok(Box::new(Ad9528::new(solver, vcxo))),
        _ => Err(ModelError::InvalidConfiguration(format!(
            "unknown clock chip: {name:?}. Supported: {}",
            SUPPORTED_CLOCK_CHIPS.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jif_common::hz;

    #[test]
    fn load_ad9528() {
        let chip = load_clock_chip("AD9528", SolverKind::Intermediate, hz(122_880_000)).unwrap();
        assert_eq!(chip.name(), "ad9528");
        assert!(chip.required_clock_names().is_empty());
    }

    #[test]
    fn load_unknown() {
        let err =
            load_clock_chip("hmc7044", SolverKind::Intermediate, hz(122_880_000)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: unknown clock chip: \"hmc7044\". Supported: ad9528"
        );
    }
}

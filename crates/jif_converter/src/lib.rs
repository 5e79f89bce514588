//! Converter device models for clock-tree planning.
//!
//! Currently this is the Analog Devices AD9081 MxFE in three
//! configurations: receive only ([`Ad9081Rx`]), transmit only
//! ([`Ad9081Tx`]) and both paths sharing one converter clock ([`Ad9081`]).
//!
//! ```
//! use jif_converter::load_converter;
//! use jif_solver::{SolveOptions, SolverKind};
//!
//! let converter = load_converter("ad9081_rx", SolverKind::Intermediate).unwrap();
//! let config = converter.solve(&SolveOptions::default()).unwrap();
//! assert!(config["ad9081_pll_ref"].is_number());
//! ```

#![warn(missing_docs)]

pub mod ad9081;
pub mod modes;

pub use ad9081::{Ad9081, Ad9081Rx, Ad9081Tx, ClockingOption, DataPath, PathLimits, PllLimits};
pub use modes::{mode_table, quick_mode, Direction, ModeTable};

use jif_model::{Converter, ModelError};
use jif_solver::SolverKind;

/// Part names accepted by [`load_converter`].
pub const SUPPORTED_CONVERTERS: [&str; 3] = ["ad9081", "ad9081_rx", "ad9081_tx"];

/// Creates a converter model with default settings by part name.
pub fn load_converter(name: &str, solver: SolverKind) -> Result<Box<dyn Converter>, ModelError> {
    match name.to_ascii_lowercase().as_str() {
        "ad9081_rx" | "ad9081-rx" | "ad9081rx" => Ok(Box::new(Ad9081Rx::new(solver)?)),
        "ad9081_tx" | "ad9081-tx" | "ad9081tx" => Ok(Box::new(Ad9081Tx::new(solver)?)),
        "ad9081" | "ad9081_mxfe" => Ok(Box::new(Ad9081::new(solver)?)),
        _ => Err(ModelError::InvalidConfiguration(format!(
            "unknown converter: {name:?}. Supported: {}",
            SUPPORTED_CONVERTERS.join(", ")
        ))),
    }
}

//! FPGA device models.
//!
//! The FPGA terminates the converter's JESD204 links. Its model turns each
//! link's lane rate into the reference clock its transceiver PLL needs.

#![warn(missing_docs)]

pub mod xilinx;

pub use xilinx::{DevKit, Transceiver, TransceiverLimits, TransceiverPll, Xilinx};

use jif_model::{Fpga, ModelError};
use jif_solver::SolverKind;

/// Creates an FPGA model for a development board by name.
pub fn load_fpga(dev_kit: &str, solver: SolverKind) -> Result<Box<dyn Fpga>, ModelError> {
    let kit: DevKit = dev_kit.parse()?;
    Ok(Box::new(Xilinx::new(solver, kit)))
}

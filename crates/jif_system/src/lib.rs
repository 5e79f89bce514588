//! System composer: one converter, one clock chip and one FPGA solved jointly.
//!
//! The composer owns no constraint logic of its own. It asks each device for
//! its model in dependency order (converter, then clock chip, then FPGA),
//! routes every clock the converter and FPGA request to a clock-chip output of
//! the same name, and solves everything as one problem on a single backend.
//!
//! ```text
//! converter.required_clocks ──names/rates──▶ clock.connect_outputs
//! fpga.required_clocks      ──names/rates──▶ clock.connect_outputs
//!                                             │
//!                                      solve_model
//!                                             │
//!             { "clock": …, "converter": …, "fpga": … }
//! ```

#![warn(missing_docs)]

use jif_model::{solve_model, ClockChip, Converter, Device, Fpga, ModelError};
use jif_solver::{new_backend, SolveOptions, SolverKind};
use tracing::debug;

/// A system built from boxed device models, as produced by plan files.
pub type DynSystem = System<Box<dyn Converter>, Box<dyn ClockChip>, Box<dyn Fpga>>;

/// One converter, one clock chip and one FPGA wired into a single problem.
#[derive(Debug)]
pub struct System<C, K, F> {
    converter: C,
    clock: K,
    fpga: F,
}

impl<C, K, F> System<C, K, F>
where
    C: Converter,
    K: ClockChip,
    F: Fpga,
{
    /// Composes three configured device models.
    pub fn new(converter: C, clock: K, fpga: F) -> Self {
        Self {
            converter,
            clock,
            fpga,
        }
    }

    /// Returns the converter model.
    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Returns the converter model for reconfiguration.
    pub fn converter_mut(&mut self) -> &mut C {
        &mut self.converter
    }

    /// Returns the clock-chip model.
    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// Returns the clock-chip model for reconfiguration.
    pub fn clock_mut(&mut self) -> &mut K {
        &mut self.clock
    }

    /// Returns the FPGA model.
    pub fn fpga(&self) -> &F {
        &self.fpga
    }

    /// Returns the FPGA model for reconfiguration.
    pub fn fpga_mut(&mut self) -> &mut F {
        &mut self.fpga
    }

    /// The backend every device was configured for.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfiguration`] if the devices disagree.
    pub fn solver(&self) -> Result<SolverKind, ModelError> {
        let solver = self.converter.solver();
        for (device, kind) in [
            (self.clock.name(), self.clock.solver()),
            (self.fpga.name(), self.fpga.solver()),
        ] {
            if kind != solver {
                return Err(ModelError::InvalidConfiguration(format!(
                    "{device} uses the {kind} solver but {} uses {solver}",
                    self.converter.name()
                )));
            }
        }
        Ok(solver)
    }

    /// Checks every device's discrete settings without solving.
    ///
    /// The FPGA is first handed the converter's current links.
    pub fn validate(&mut self) -> Result<SolverKind, ModelError> {
        self.fpga.set_links(self.converter.links());
        let solver = self.solver()?;
        self.converter.validate_config()?;
        self.clock.validate_config()?;
        self.fpga.validate_config()?;
        Ok(solver)
    }

    /// Solves the whole clock tree.
    ///
    /// Returns the per-device configurations keyed by role. Nothing partial is
    /// returned when the problem is infeasible or the solver gives up.
    pub fn solve(&mut self, options: &SolveOptions) -> Result<serde_json::Value, ModelError> {
        let solver = self.validate()?;
        let mut model = new_backend(solver);

        let converter = self.converter.required_clocks(model.as_mut())?;
        let mut clock = self.clock.required_clocks(model.as_mut())?;
        let converter_names = self.converter.required_clock_names();
        debug!(clocks = ?converter_names, "wiring converter clocks");
        self.clock.connect_outputs(
            &mut clock.namespace,
            model.as_mut(),
            &converter_names,
            &converter.clocks,
        )?;

        let fpga = self.fpga.required_clocks(model.as_mut())?;
        let fpga_names = self.fpga.required_clock_names();
        debug!(clocks = ?fpga_names, "wiring FPGA clocks");
        self.clock
            .connect_outputs(&mut clock.namespace, model.as_mut(), &fpga_names, &fpga.clocks)?;

        debug!(
            solver = %solver,
            variables = model.variable_count(),
            constraints = model.constraint_count(),
            "solving system"
        );
        let result = solve_model(model.as_mut(), options);
        if let Some(report) = model.last_report() {
            debug!(
                elapsed_ms = report.elapsed.as_millis() as u64,
                reason = report.reason_unknown.as_deref().unwrap_or("-"),
                status = %model.state(),
                "system solve finished"
            );
        }
        result?;

        Ok(serde_json::json!({
            "clock": self.clock.config(&clock.namespace, model.as_ref())?,
            "converter": self.converter.config(&converter.namespace, model.as_ref())?,
            "fpga": self.fpga.config(&fpga.namespace, model.as_ref())?,
        }))
    }
}

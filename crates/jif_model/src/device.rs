//! The device model contract shared by converters, clock chips and FPGAs.
//!
//! A device model owns its physical limits and validity tables, holds the
//! discrete settings chosen by the caller, and contributes variables and
//! constraints to a [`Backend`] on request. It never owns the backend and
//! never keeps registration state between calls: every
//! [`Device::required_clocks`] call reopens the device's scope on the
//! backend and returns a fresh [`Namespace`] that the caller hands back to
//! [`Device::config`] after solving.

use crate::error::ModelError;
use crate::jesd::JesdLink;
use crate::namespace::Namespace;
use jif_solver::{new_backend, Backend, Expr, SolveOptions, SolveStatus, SolverKind};
use std::fmt;

/// What one [`Device::required_clocks`] call registered.
#[derive(Clone, Debug)]
pub struct ClockRequest {
    /// Every variable and derived quantity the device defined.
    pub namespace: Namespace,
    /// The clocks the device needs from upstream, in
    /// [`Device::required_clock_names`] order.
    pub clocks: Vec<Expr>,
}

/// A component that contributes clock relationships to a shared model.
pub trait Device: fmt::Debug {
    /// Returns the device's part name (e.g. `"ad9081_rx"`).
    fn name(&self) -> &str;

    /// Returns the backend this device was configured for.
    fn solver(&self) -> SolverKind;

    /// Checks the discrete, caller-chosen settings.
    ///
    /// Never touches a backend, so misconfiguration is reported before the
    /// solver runs.
    fn validate_config(&self) -> Result<(), ModelError>;

    /// Names of the clocks returned by
    /// [`required_clocks`](Device::required_clocks), in order.
    fn required_clock_names(&self) -> Vec<String>;

    /// Registers this device's variables and constraints with `model`.
    ///
    /// Opens the device's scope on every call, so whatever an earlier call
    /// registered in `model` is replaced rather than added to. Calling it
    /// again on an unchanged device leaves an identically shaped model.
    fn required_clocks(&self, model: &mut dyn Backend) -> Result<ClockRequest, ModelError>;

    /// Reads the solved configuration back out of `model`.
    ///
    /// # Errors
    ///
    /// Propagates [`jif_solver::SolverError::NotSolved`] if `model` has no
    /// solution.
    fn config(
        &self,
        namespace: &Namespace,
        model: &dyn Backend,
    ) -> Result<serde_json::Value, ModelError>;

    /// Solves this device on its own and returns its flat configuration.
    fn solve(&self, options: &SolveOptions) -> Result<serde_json::Value, ModelError> {
        let mut model = new_backend(self.solver());
        let request = self.required_clocks(model.as_mut())?;
        solve_model(model.as_mut(), options)?;
        self.config(&request.namespace, model.as_ref())
    }
}

/// A data converter with one or more JESD204 links to the FPGA.
pub trait Converter: Device {
    /// The links this converter drives with its current settings.
    fn links(&self) -> Vec<JesdLink>;
}

/// A clock generator that produces the rates other devices request.
pub trait ClockChip: Device {
    /// Creates one output per requested clock and ties its rate to the request.
    ///
    /// `names` and `rates` are parallel; the outputs are recorded in
    /// `namespace` so [`Device::config`] can report them.
    fn connect_outputs(
        &self,
        namespace: &mut Namespace,
        model: &mut dyn Backend,
        names: &[String],
        rates: &[Expr],
    ) -> Result<(), ModelError>;
}

/// An FPGA receiving the converter's links.
pub trait Fpga: Device {
    /// Replaces the links the FPGA must terminate.
    fn set_links(&mut self, links: Vec<JesdLink>);
}

/// Runs the solver and maps non-feasible outcomes to errors.
pub fn solve_model(model: &mut dyn Backend, options: &SolveOptions) -> Result<(), ModelError> {
    match model.solve(options)? {
        SolveStatus::Feasible => Ok(()),
        SolveStatus::Infeasible => Err(ModelError::Infeasible {
            constraints: model.constraint_count(),
            variables: model.variable_count(),
        }),
        SolveStatus::Aborted => Err(ModelError::Aborted {
            reason: model
                .last_report()
                .and_then(|report| report.reason_unknown)
                .unwrap_or_default(),
        }),
    }
}

impl<T: Device + ?Sized> Device for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solver(&self) -> SolverKind {
        (**self).solver()
    }

    fn validate_config(&self) -> Result<(), ModelError> {
        (**self).validate_config()
    }

    fn required_clock_names(&self) -> Vec<String> {
        (**self).required_clock_names()
    }

    fn required_clocks(&self, model: &mut dyn Backend) -> Result<ClockRequest, ModelError> {
        (**self).required_clocks(model)
    }

    fn config(
        &self,
        namespace: &Namespace,
        model: &dyn Backend,
    ) -> Result<serde_json::Value, ModelError> {
        (**self).config(namespace, model)
    }

    fn solve(&self, options: &SolveOptions) -> Result<serde_json::Value, ModelError> {
        (**self).solve(options)
    }
}

impl<T: Converter + ?Sized> Converter for Box<T> {
    fn links(&self) -> Vec<JesdLink> {
        (**self).links()
    }
}

impl<T: ClockChip + ?Sized> ClockChip for Box<T> {
    fn connect_outputs(
        &self,
        namespace: &mut Namespace,
        model: &mut dyn Backend,
        names: &[String],
        rates: &[Expr],
    ) -> Result<(), ModelError> {
        (**self).connect_outputs(namespace, model, names, rates)
    }
}

impl<T: Fpga + ?Sized> Fpga for Box<T> {
    fn set_links(&mut self, links: Vec<JesdLink>) {
        (**self).set_links(links);
    }
}

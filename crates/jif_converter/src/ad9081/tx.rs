//! AD9081 transmit path.

use super::{
    pll_json, sysref, Clocking, ClockingOption, ConverterClockRelation, DataPath, PathLimits,
    PllLimits,
};
use crate::modes::Direction;
use jif_common::{rational_to_json, Rational};
use jif_model::{ClockRequest, Converter, Device, JesdClass, JesdLink, ModelError, Namespace};
use jif_solver::{Backend, Expr, SolverKind};
use tracing::debug;

/// Name of the transmit link from the FPGA.
pub const TX_LINK: &str = "ad9081_tx";

/// AD9081 configured as a DAC only.
///
/// The DAC runs directly at the converter clock:
/// `converter_clk = interpolation * sample_clock`.
#[derive(Clone, Debug, PartialEq)]
pub struct Ad9081Tx {
    solver: SolverKind,
    clocking: Clocking,
    path: DataPath,
}

impl Ad9081Tx {
    /// Creates a transmit model for the given backend.
    pub fn new(solver: SolverKind) -> Result<Self, ModelError> {
        let limits = PathLimits::tx();
        Ok(Self {
            solver,
            clocking: Clocking::new((limits.converter_clock_min, limits.converter_clock_max)),
            path: DataPath::new(Direction::Tx)?,
        })
    }

    /// Creates a transmit model from a backend tag.
    pub fn with_solver(solver: &str) -> Result<Self, ModelError> {
        Self::new(solver.parse()?)
    }

    /// Returns the datapath settings.
    pub fn path(&self) -> &DataPath {
        &self.path
    }

    /// Returns the datapath settings for modification.
    pub fn path_mut(&mut self) -> &mut DataPath {
        &mut self.path
    }

    /// Sets the baseband sample clock.
    pub fn set_sample_clock(&mut self, sample_clock: Rational) {
        self.path.set_sample_clock(sample_clock);
    }

    /// Sets the interpolation factor.
    pub fn set_interpolation(&mut self, interpolation: u32) {
        self.path.set_datapath_ratio(interpolation);
    }

    /// Selects a JESD204 quick-configuration mode.
    pub fn set_quick_configuration_mode(
        &mut self,
        class: JesdClass,
        mode: &str,
    ) -> Result<(), ModelError> {
        self.path.set_quick_configuration_mode(class, mode)
    }

    /// Returns the clocking option.
    pub fn clocking_option(&self) -> ClockingOption {
        self.clocking.option
    }

    /// Selects integrated-PLL or direct clocking.
    pub fn set_clocking_option(&mut self, option: ClockingOption) {
        self.clocking.option = option;
    }

    /// Overrides the PLL operating limits.
    pub fn set_pll_limits(&mut self, limits: PllLimits) {
        self.clocking.pll = limits;
    }

    /// Overrides the allowed converter-clock range.
    pub fn set_converter_clock_range(&mut self, min: Rational, max: Rational) {
        self.clocking.converter_clock_range = (min, max);
    }
}

impl ConverterClockRelation for Ad9081Tx {
    fn converter_clock_relation(
        &self,
        ns: &mut Namespace,
        model: &mut dyn Backend,
    ) -> Result<Expr, ModelError> {
        let dac_clk = ns.constant("dac_clk", self.path.converter_rate());
        ns.derived(model, "converter_clk", dac_clk)
    }
}

impl Device for Ad9081Tx {
    fn name(&self) -> &str {
        "ad9081_tx"
    }

    fn solver(&self) -> SolverKind {
        self.solver
    }

    fn validate_config(&self) -> Result<(), ModelError> {
        self.clocking.check()?;
        self.path.validate()
    }

    fn required_clock_names(&self) -> Vec<String> {
        vec![
            self.clocking.input_clock_name().to_string(),
            "ad9081_sysref".to_string(),
        ]
    }

    fn required_clocks(&self, model: &mut dyn Backend) -> Result<ClockRequest, ModelError> {
        self.validate_config()?;
        let mut ns = Namespace::open(model, self.name())?;
        let ref_clk = self.clocking.pll_config(self, &mut ns, model)?;
        let sysref = sysref(&mut ns, model, "", &self.path.link(TX_LINK))?;
        debug!(
            device = self.name(),
            entries = ns.len(),
            variables = model.variable_count(),
            constraints = model.constraint_count(),
            "registered converter model"
        );
        Ok(ClockRequest {
            namespace: ns,
            clocks: vec![ref_clk, sysref],
        })
    }

    fn config(
        &self,
        ns: &Namespace,
        model: &dyn Backend,
    ) -> Result<serde_json::Value, ModelError> {
        let names = self.required_clock_names();
        Ok(serde_json::json!({
            "clocking_option": self.clocking.option.name(),
            "sample_clock": rational_to_json(&self.path.sample_clock()),
            "interpolation": self.path.datapath_ratio(),
            "jesd": self.path.to_json(TX_LINK),
            "pll": pll_json(ns, model)?,
            "dac_clk": ns.json(model, "dac_clk")?,
            "converter_clk": ns.json(model, "converter_clk")?,
            "lmfc_divisor_sysref": ns.json(model, "lmfc_divisor_sysref")?,
            names[0].as_str(): ns.json(model, "ref_clk")?,
            names[1].as_str(): ns.json(model, "sysref")?,
        }))
    }
}

impl Converter for Ad9081Tx {
    fn links(&self) -> Vec<JesdLink> {
        vec![self.path.link(TX_LINK)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jif_common::hz;
    use jif_model::solve_model;
    use jif_solver::{new_backend, SolveOptions};

    /// 250 MSPS with interpolation 12 puts the DAC at 3 GHz, so the VCO can
    /// only be 3, 6, 9 or 12 GHz.
    fn tx_at_3ghz(kind: SolverKind, vco_min: i128, vco_max: i128) -> Ad9081Tx {
        let mut tx = Ad9081Tx::new(kind).unwrap();
        tx.set_sample_clock(hz(250_000_000));
        tx.set_interpolation(12);
        tx.set_pll_limits(PllLimits {
            vco_min: hz(vco_min),
            vco_max: hz(vco_max),
            ..PllLimits::default()
        });
        tx
    }

    #[test]
    fn vco_at_lower_bound_is_accepted() {
        for kind in SolverKind::ALL {
            let dev = tx_at_3ghz(kind, 6_000_000_000, 6_000_000_000);
            let config = dev.solve(&SolveOptions::default()).unwrap();
            assert_eq!(config["pll"]["vco"], 6_000_000_000i64);
            assert_eq!(config["pll"]["d"], 2);
        }
    }

    #[test]
    fn vco_at_upper_bound_is_accepted() {
        for kind in SolverKind::ALL {
            let dev = tx_at_3ghz(kind, 12_000_000_000, 12_000_000_000);
            let config = dev.solve(&SolveOptions::default()).unwrap();
            assert_eq!(config["pll"]["vco"], 12_000_000_000i64);
        }
    }

    #[test]
    fn vco_one_hz_inside_both_bounds_is_infeasible() {
        for kind in SolverKind::ALL {
            let dev = tx_at_3ghz(kind, 6_000_000_001, 8_999_999_999);
            let err = dev.solve(&SolveOptions::default()).unwrap_err();
            assert!(matches!(err, ModelError::Infeasible { .. }));
        }
    }

    #[test]
    fn empty_converter_clock_window_is_infeasible() {
        let mut dev = Ad9081Tx::new(SolverKind::Intermediate).unwrap();
        // Default DAC clock is 245.76 MHz * 12 = 2.94912 GHz.
        dev.set_converter_clock_range(hz(3_000_000_000), hz(3_100_000_000));
        let err = dev.solve(&SolveOptions::default()).unwrap_err();
        assert!(matches!(err, ModelError::Infeasible { .. }));
    }

    #[test]
    fn inverted_converter_clock_range_is_invalid() {
        let mut dev = Ad9081Tx::new(SolverKind::Intermediate).unwrap();
        dev.set_converter_clock_range(hz(4_000_000_000), hz(3_000_000_000));
        let err = dev.validate_config().unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfiguration(_)));
    }

    #[test]
    fn required_clocks_is_idempotent() {
        for kind in SolverKind::ALL {
            let dev = Ad9081Tx::new(kind).unwrap();
            let mut model = new_backend(kind);
            let first = dev.required_clocks(model.as_mut()).unwrap();
            let sizes = (model.variable_count(), model.constraint_count());
            let second = dev.required_clocks(model.as_mut()).unwrap();
            assert_eq!((model.variable_count(), model.constraint_count()), sizes);
            assert_eq!(
                first.namespace.keys().collect::<Vec<_>>(),
                second.namespace.keys().collect::<Vec<_>>()
            );
            solve_model(model.as_mut(), &SolveOptions::default()).unwrap();
            let config = dev.config(&second.namespace, model.as_ref()).unwrap();
            assert_eq!(config["dac_clk"], 2_949_120_000i64);
        }
    }

    #[test]
    fn retry_after_widening_the_window_solves() {
        for kind in SolverKind::ALL {
            let mut dev = Ad9081Tx::new(kind).unwrap();
            dev.set_converter_clock_range(hz(3_000_000_000), hz(3_100_000_000));
            let mut model = new_backend(kind);
            dev.required_clocks(model.as_mut()).unwrap();
            let sizes = (model.variable_count(), model.constraint_count());

            let limits = PathLimits::tx();
            dev.set_converter_clock_range(limits.converter_clock_min, limits.converter_clock_max);
            let request = dev.required_clocks(model.as_mut()).unwrap();
            assert_eq!((model.variable_count(), model.constraint_count()), sizes);
            solve_model(model.as_mut(), &SolveOptions::default()).unwrap();
            let cc = request.namespace.value(model.as_ref(), "converter_clk").unwrap();
            assert_eq!(cc, hz(2_949_120_000));
        }
    }

    /// Fixes the VCO at 6 GHz, so the phase detector runs at
    /// `6 GHz / (m_vco * n_vco)` and 600 MHz is its fastest reachable rate.
    fn tx_with_pfd(kind: SolverKind, pfd_min: i128, pfd_max: i128) -> Ad9081Tx {
        let mut tx = tx_at_3ghz(kind, 6_000_000_000, 6_000_000_000);
        tx.set_pll_limits(PllLimits {
            pfd_min: hz(pfd_min),
            pfd_max: hz(pfd_max),
            vco_min: hz(6_000_000_000),
            vco_max: hz(6_000_000_000),
        });
        tx
    }

    #[test]
    fn pfd_at_bound_is_accepted() {
        for kind in SolverKind::ALL {
            let dev = tx_with_pfd(kind, 600_000_000, 600_000_000);
            let config = dev.solve(&SolveOptions::default()).unwrap();
            assert_eq!(config["pll"]["m_vco"], 5);
            assert_eq!(config["pll"]["n_vco"], 2);
        }
    }

    #[test]
    fn pfd_above_reachable_rates_is_infeasible() {
        for kind in SolverKind::ALL {
            let dev = tx_with_pfd(kind, 600_000_001, 750_000_000);
            let err = dev.solve(&SolveOptions::default()).unwrap_err();
            assert!(matches!(err, ModelError::Infeasible { .. }));
        }
    }

    #[test]
    fn interpolation_outside_set_fails_before_solving() {
        let mut dev = Ad9081Tx::new(SolverKind::Substitution).unwrap();
        dev.set_interpolation(7);
        let mut model = new_backend(dev.solver());
        let err = dev.required_clocks(model.as_mut()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfiguration(_)));
        assert_eq!(model.variable_count(), 0);
    }

    #[test]
    fn unknown_solver_tag_fails_at_construction() {
        let err = Ad9081Tx::with_solver("gekko").unwrap_err();
        assert!(matches!(err, ModelError::Solver(_)));
    }
}

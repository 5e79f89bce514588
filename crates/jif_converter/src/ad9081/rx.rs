//! AD9081 receive path.

use super::{
    pll_json, sysref, Clocking, ClockingOption, ConverterClockRelation, DataPath, PathLimits,
    PllLimits, L_AVAILABLE,
};
use crate::modes::Direction;
use jif_common::{rational_to_json, Rational};
use jif_model::{ClockRequest, Converter, Device, JesdClass, JesdLink, ModelError, Namespace};
use jif_solver::{Backend, Domain, Expr, SolverKind};
use tracing::debug;

/// Name of the receive link towards the FPGA.
pub const RX_LINK: &str = "ad9081_rx";

/// AD9081 configured as an ADC only.
///
/// `converter_clk = decimation * sample_clock * l`, with `l` chosen by the
/// solver from `{1, 2, 3, 4}`.
#[derive(Clone, Debug, PartialEq)]
pub struct Ad9081Rx {
    solver: SolverKind,
    clocking: Clocking,
    path: DataPath,
}

impl Ad9081Rx {
    /// Creates a receive model for the given backend.
    pub fn new(solver: SolverKind) -> Result<Self, ModelError> {
        let limits = PathLimits::rx();
        Ok(Self {
            solver,
            clocking: Clocking::new((limits.converter_clock_min, limits.converter_clock_max)),
            path: DataPath::new(Direction::Rx)?,
        })
    }

    /// Creates a receive model from a backend tag such as `"intermediate"`.
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

    /// Sets the decimation factor.
    pub fn set_decimation(&mut self, decimation: u32) {
        self.path.set_datapath_ratio(decimation);
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

impl ConverterClockRelation for Ad9081Rx {
    fn converter_clock_relation(
        &self,
        ns: &mut Namespace,
        model: &mut dyn Backend,
    ) -> Result<Expr, ModelError> {
        let l = ns.variable(model, "l", &Domain::integers(L_AVAILABLE))?;
        let adc_clk = ns.constant("adc_clk", self.path.converter_rate());
        ns.derived(model, "converter_clk", adc_clk * l)
    }
}

impl Device for Ad9081Rx {
    fn name(&self) -> &str {
        "ad9081_rx"
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
        let sysref = sysref(&mut ns, model, "", &self.path.link(RX_LINK))?;
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
            "decimation": self.path.datapath_ratio(),
            "jesd": self.path.to_json(RX_LINK),
            "pll": pll_json(ns, model)?,
            "l": ns.json(model, "l")?,
            "adc_clk": ns.json(model, "adc_clk")?,
            "converter_clk": ns.json(model, "converter_clk")?,
            "lmfc_divisor_sysref": ns.json(model, "lmfc_divisor_sysref")?,
            names[0].as_str(): ns.json(model, "ref_clk")?,
            names[1].as_str(): ns.json(model, "sysref")?,
        }))
    }
}

impl Converter for Ad9081Rx {
    fn links(&self) -> Vec<JesdLink> {
        vec![self.path.link(RX_LINK)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jif_common::hz;
    use jif_solver::{new_backend, SolveOptions};

    fn rx(kind: SolverKind, sample_clock: i128, decimation: u32) -> Ad9081Rx {
        let mut rx = Ad9081Rx::new(kind).unwrap();
        rx.set_sample_clock(hz(sample_clock));
        rx.set_decimation(decimation);
        rx
    }

    #[test]
    fn required_clock_names_follow_clocking_option() {
        let mut dev = Ad9081Rx::new(SolverKind::Intermediate).unwrap();
        assert_eq!(dev.required_clock_names(), vec!["ad9081_pll_ref", "ad9081_sysref"]);
        dev.set_clocking_option(ClockingOption::Direct);
        assert_eq!(dev.required_clock_names(), vec!["ad9081_dac_clock", "ad9081_sysref"]);
    }

    #[test]
    fn standalone_solve_respects_limits() {
        for kind in SolverKind::ALL {
            let dev = rx(kind, 122_880_000, 12);
            let config = dev.solve(&SolveOptions::default()).unwrap();
            let cc = config["converter_clk"].as_f64().unwrap();
            assert!((1.45e9..=4e9).contains(&cc));
            let vco = config["pll"]["vco"].as_f64().unwrap();
            assert!((6e9..=12e9).contains(&vco));
            let l = config["l"].as_i64().unwrap();
            assert!((1..=4).contains(&l));
            assert_eq!(config["clocking_option"], "integrated_pll");
            assert!(config["ad9081_pll_ref"].is_number());
            assert!(config["ad9081_sysref"].is_number());
        }
    }

    #[test]
    fn unreachable_converter_clock_is_infeasible() {
        // 122.88 MSPS without decimation tops out at 4 * 122.88 MHz.
        let dev = rx(SolverKind::Intermediate, 122_880_000, 1);
        let err = dev.solve(&SolveOptions::default()).unwrap_err();
        assert!(matches!(err, ModelError::Infeasible { .. }));
    }

    #[test]
    fn direct_clocking_is_not_implemented() {
        let mut dev = Ad9081Rx::new(SolverKind::Substitution).unwrap();
        dev.set_clocking_option(ClockingOption::Direct);
        let mut model = new_backend(dev.solver());
        let err = dev.required_clocks(model.as_mut()).unwrap_err();
        assert!(matches!(err, ModelError::NotImplemented(_)));
    }

    #[test]
    fn pll_relation_round_trips_exactly() {
        for kind in SolverKind::ALL {
            let dev = rx(kind, 122_880_000, 12);
            let mut model = new_backend(kind);
            let request = dev.required_clocks(model.as_mut()).unwrap();
            model.solve(&SolveOptions::default()).unwrap();
            let ns = &request.namespace;
            let value = |key: &str| ns.value(model.as_ref(), key).unwrap();
            let recomputed =
                value("ref_clk") * value("m_vco") * value("n_vco") / (value("r") * value("d"));
            assert_eq!(recomputed, value("converter_clk"));
            assert_eq!(value("converter_clk"), value("adc_clk") * value("l"));
        }
    }

    #[test]
    fn sysref_divides_the_multiframe_clock() {
        for kind in SolverKind::ALL {
            let dev = rx(kind, 122_880_000, 12);
            let mut model = new_backend(kind);
            let request = dev.required_clocks(model.as_mut()).unwrap();
            model.solve(&SolveOptions::default()).unwrap();
            let ns = &request.namespace;
            let divisor = ns.value(model.as_ref(), "lmfc_divisor_sysref").unwrap();
            assert!(divisor >= hz(1) && divisor <= hz(20));
            let expected = dev.links()[0].multiframe_clock() / (divisor * divisor);
            assert_eq!(ns.value(model.as_ref(), "sysref").unwrap(), expected);
            assert_eq!(model.value(&request.clocks[1]).unwrap(), expected);
        }
    }

    #[test]
    fn declared_domains_are_non_empty() {
        let dev = rx(SolverKind::Substitution, 122_880_000, 12);
        dev.validate_config().unwrap();
        let mut model = new_backend(dev.solver());
        dev.required_clocks(model.as_mut()).unwrap();
        let variables = model.variables();
        assert!(!variables.is_empty());
        assert!(variables.iter().all(|v| matches!(v.domain_size, Some(n) if n > 0)));
        assert!(variables.iter().all(|v| v.name.starts_with("ad9081_rx.")));
    }

    #[test]
    fn links_carry_path_settings() {
        let dev = rx(SolverKind::Intermediate, 122_880_000, 12);
        let links = dev.links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].name, RX_LINK);
        assert_eq!(links[0].bit_clock(), hz(4_915_200_000));
    }
}

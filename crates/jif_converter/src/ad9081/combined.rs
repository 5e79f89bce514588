//! AD9081 with both datapaths active.

use super::rx::RX_LINK;
use super::tx::TX_LINK;
use super::{
    pll_json, sysref, Clocking, ClockingOption, ConverterClockRelation, DataPath, PathLimits,
    PllLimits, L_AVAILABLE,
};
use crate::modes::Direction;
use jif_common::{rational_to_json, Rational};
use jif_model::{ClockRequest, Converter, Device, JesdLink, ModelError, Namespace};
use jif_solver::{Backend, Expr, SolverKind};
use tracing::debug;

/// AD9081 running its ADC and DAC paths from one converter clock.
///
/// The DAC runs at the converter clock and the ADC at the converter clock
/// divided by a fixed integer `L`, so the two datapath rates must relate by
/// one of `{1, 2, 3, 4}`. The converter clock must satisfy both paths'
/// limits at once.
#[derive(Clone, Debug, PartialEq)]
pub struct Ad9081 {
    solver: SolverKind,
    clocking: Clocking,
    rx: DataPath,
    tx: DataPath,
}

impl Ad9081 {
    /// Creates a dual-path model for the given backend.
    ///
    /// Both paths start at their defaults; the DAC clock is then twice the
    /// ADC clock.
    pub fn new(solver: SolverKind) -> Result<Self, ModelError> {
        let (rx, tx) = (PathLimits::rx(), PathLimits::tx());
        let range = (
            rx.converter_clock_min.max(tx.converter_clock_min),
            rx.converter_clock_max.min(tx.converter_clock_max),
        );
        Ok(Self {
            solver,
            clocking: Clocking::new(range),
            rx: DataPath::new(Direction::Rx)?,
            tx: DataPath::new(Direction::Tx)?,
        })
    }

    /// Creates a dual-path model from a backend tag.
    pub fn with_solver(solver: &str) -> Result<Self, ModelError> {
        Self::new(solver.parse()?)
    }

    /// Returns the receive datapath.
    pub fn rx(&self) -> &DataPath {
        &self.rx
    }

    /// Returns the receive datapath for modification.
    pub fn rx_mut(&mut self) -> &mut DataPath {
        &mut self.rx
    }

    /// Returns the transmit datapath.
    pub fn tx(&self) -> &DataPath {
        &self.tx
    }

    /// Returns the transmit datapath for modification.
    pub fn tx_mut(&mut self) -> &mut DataPath {
        &mut self.tx
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

    /// The fixed divider between the DAC clock and the ADC clock.
    pub fn adc_divider(&self) -> Result<i64, ModelError> {
        let dac = self.tx.converter_rate();
        let adc = self.rx.converter_rate();
        if adc == Rational::from_integer(0) {
            return Err(ModelError::InvalidConfiguration(
                "ADC clock is zero; set a non-zero RX sample clock and decimation".to_string(),
            ));
        }
        let ratio = dac / adc;
        if ratio.is_integer() && L_AVAILABLE.iter().any(|l| i128::from(*l) == *ratio.numer()) {
            let l = *ratio.numer() as i64;
            return Ok(l);
        }
        Err(ModelError::InvalidConfiguration(format!(
            "ADC clock must be DAC clock / L where L in [1, 2, 3, 4], got {ratio}"
        )))
    }
}

impl ConverterClockRelation for Ad9081 {
    fn converter_clock_relation(
        &self,
        ns: &mut Namespace,
        model: &mut dyn Backend,
    ) -> Result<Expr, ModelError> {
        let l = self.adc_divider()?;
        ns.constant("l", Rational::from_integer(i128::from(l)));
        ns.constant("adc_clk", self.rx.converter_rate());
        let dac_clk = ns.constant("dac_clk", self.tx.converter_rate());
        ns.derived(model, "converter_clk", dac_clk)
    }
}

impl Device for Ad9081 {
    fn name(&self) -> &str {
        "ad9081"
    }

    fn solver(&self) -> SolverKind {
        self.solver
    }

    fn validate_config(&self) -> Result<(), ModelError> {
        self.clocking.check()?;
        self.rx.validate()?;
        self.tx.validate()?;
        self.adc_divider().map(|_| ())
    }

    fn required_clock_names(&self) -> Vec<String> {
        vec![
            self.clocking.input_clock_name().to_string(),
            "ad9081_adc_sysref".to_string(),
            "ad9081_dac_sysref".to_string(),
        ]
    }

    fn required_clocks(&self, model: &mut dyn Backend) -> Result<ClockRequest, ModelError> {
        self.validate_config()?;
        let mut ns = Namespace::open(model, self.name())?;
        let ref_clk = self.clocking.pll_config(self, &mut ns, model)?;
        let adc_sysref = sysref(&mut ns, model, "adc_", &self.rx.link(RX_LINK))?;
        let dac_sysref = sysref(&mut ns, model, "dac_", &self.tx.link(TX_LINK))?;
        debug!(
            device = self.name(),
            entries = ns.len(),
            variables = model.variable_count(),
            constraints = model.constraint_count(),
            "registered converter model"
        );
        Ok(ClockRequest {
            namespace: ns,
            clocks: vec![ref_clk, adc_sysref, dac_sysref],
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
            "adc": {
                "sample_clock": rational_to_json(&self.rx.sample_clock()),
                "decimation": self.rx.datapath_ratio(),
                "jesd": self.rx.to_json(RX_LINK),
            },
            "dac": {
                "sample_clock": rational_to_json(&self.tx.sample_clock()),
                "interpolation": self.tx.datapath_ratio(),
                "jesd": self.tx.to_json(TX_LINK),
            },
            "pll": pll_json(ns, model)?,
            "l": ns.json(model, "l")?,
            "adc_clk": ns.json(model, "adc_clk")?,
            "dac_clk": ns.json(model, "dac_clk")?,
            "converter_clk": ns.json(model, "converter_clk")?,
            "adc_lmfc_divisor_sysref": ns.json(model, "adc_lmfc_divisor_sysref")?,
            "dac_lmfc_divisor_sysref": ns.json(model, "dac_lmfc_divisor_sysref")?,
            names[0].as_str(): ns.json(model, "ref_clk")?,
            names[1].as_str(): ns.json(model, "adc_sysref")?,
            names[2].as_str(): ns.json(model, "dac_sysref")?,
        }))
    }
}

impl Converter for Ad9081 {
    fn links(&self) -> Vec<JesdLink> {
        vec![self.rx.link(RX_LINK), self.tx.link(TX_LINK)]
    }
}

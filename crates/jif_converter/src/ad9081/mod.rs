//! AD9081 MxFE clocking models.
//!
//! The AD9081 derives its high-speed converter clock either from an on-chip
//! integer PLL or from an external clock:
//!
//! ```text
//! converter_clock = ref_clk * m_vco * n_vco / r / d
//! vco             = ref_clk * m_vco * n_vco / r
//! ```
//!
//! The DAC runs at the converter clock and the ADC at the converter clock
//! divided by `l`. Each JESD204 direction additionally needs a SYSREF at the
//! multiframe clock divided by the square of an LMFC divisor.
//!
//! Three variants share this relation: [`Ad9081Rx`], [`Ad9081Tx`] and the
//! dual-path [`Ad9081`]. Each supplies its own converter-clock relation; the
//! PLL and SYSREF plumbing below is common.

mod combined;
mod rx;
mod tx;

pub use combined::Ad9081;
pub use rx::Ad9081Rx;
pub use tx::Ad9081Tx;

use crate::modes::{mode_table, quick_mode, Direction};
use jif_common::{hz, Rational};
use jif_model::{
    check_in_set, check_rate, constrain_range, JesdClass, JesdLink, JesdParams, ModelError,
    Namespace,
};
use jif_solver::{Backend, Domain, Expr};
use std::fmt;
use std::str::FromStr;

/// PLL feedback multiplier values.
pub const M_VCO_AVAILABLE: [i64; 4] = [5, 7, 8, 11];
/// PLL feedback divider range.
pub const N_VCO_RANGE: (i64, i64) = (2, 50);
/// PLL reference divider values.
pub const R_AVAILABLE: [i64; 4] = [1, 2, 3, 4];
/// Output divider values between the VCO and the converter clock.
pub const D_AVAILABLE: [i64; 4] = [1, 2, 3, 4];
/// Converter-clock to ADC-clock divider values.
pub const L_AVAILABLE: [i64; 4] = [1, 2, 3, 4];
/// LMFC divisor range for SYSREF generation.
pub const LMFC_DIVISOR_RANGE: (i64, i64) = (1, 20);

/// Decimation and interpolation factors supported by the datapath.
pub const DATAPATH_RATIOS: [u32; 18] = [
    1, 2, 3, 4, 6, 8, 9, 12, 16, 18, 24, 32, 36, 48, 64, 72, 96, 144,
];

/// JESD204 `M` values.
pub const M_AVAILABLE: [u32; 8] = [1, 2, 3, 4, 6, 8, 12, 16];
/// JESD204 `L` values.
pub const L_LANES_AVAILABLE: [u32; 6] = [1, 2, 3, 4, 6, 8];
/// JESD204 `N` values.
pub const N_AVAILABLE: [u32; 2] = [12, 16];
/// JESD204 `Np` values.
pub const NP_AVAILABLE: [u32; 3] = [12, 16, 24];
/// JESD204 `F` values.
pub const F_AVAILABLE: [u32; 10] = [1, 2, 3, 4, 6, 8, 12, 16, 24, 32];
/// JESD204 `S` values.
pub const S_AVAILABLE: [u32; 4] = [1, 2, 4, 8];
/// JESD204 `K` values.
pub const K_AVAILABLE: [u32; 8] = [4, 8, 12, 16, 20, 24, 28, 32];
/// JESD204 `CS` values.
pub const CS_AVAILABLE: [u32; 4] = [0, 1, 2, 3];
/// JESD204 `CF` values.
pub const CF_AVAILABLE: [u32; 1] = [0];

/// Lane-rate range for a JESD204 class.
pub fn bit_clock_range(class: JesdClass) -> (Rational, Rational) {
    match class {
        JesdClass::Jesd204B => (hz(1_500_000_000), hz(15_500_000_000)),
        JesdClass::Jesd204C => (hz(6_000_000_000), hz(24_750_000_000)),
    }
}

/// How the converter clock is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ClockingOption {
    /// The on-chip PLL multiplies a reference clock.
    #[default]
    IntegratedPll,
    /// An external clock is supplied at the converter-clock rate.
    Direct,
}

impl ClockingOption {
    /// Returns the canonical tag.
    pub fn name(self) -> &'static str {
        match self {
            ClockingOption::IntegratedPll => "integrated_pll",
            ClockingOption::Direct => "direct",
        }
    }
}

impl fmt::Display for ClockingOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClockingOption {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "integrated_pll" => Ok(ClockingOption::IntegratedPll),
            "direct" => Ok(ClockingOption::Direct),
            _ => Err(ModelError::InvalidConfiguration(format!(
                "clocking option {s:?} is not supported; \
                 allowed values are [integrated_pll, direct]"
            ))),
        }
    }
}

/// Operating limits of the integrated PLL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PllLimits {
    /// Minimum phase-detector frequency.
    pub pfd_min: Rational,
    /// Maximum phase-detector frequency.
    pub pfd_max: Rational,
    /// Minimum VCO frequency.
    pub vco_min: Rational,
    /// Maximum VCO frequency.
    pub vco_max: Rational,
}

impl Default for PllLimits {
    fn default() -> Self {
        Self {
            pfd_min: hz(25_000_000),
            pfd_max: hz(750_000_000),
            vco_min: hz(6_000_000_000),
            vco_max: hz(12_000_000_000),
        }
    }
}

/// Fixed rate limits of one datapath direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathLimits {
    /// Lowest converter clock the path runs at.
    pub converter_clock_min: Rational,
    /// Highest converter clock the path runs at.
    pub converter_clock_max: Rational,
    /// Lowest baseband sample clock.
    pub sample_clock_min: Rational,
    /// Highest baseband sample clock.
    pub sample_clock_max: Rational,
}

impl PathLimits {
    /// Receive-path limits.
    pub fn rx() -> Self {
        Self {
            converter_clock_min: hz(1_450_000_000),
            converter_clock_max: hz(4_000_000_000),
            sample_clock_min: Rational::new(312_500_000, 16),
            sample_clock_max: hz(4_000_000_000),
        }
    }

    /// Transmit-path limits.
    pub fn tx() -> Self {
        Self {
            converter_clock_min: hz(2_900_000_000),
            converter_clock_max: hz(12_000_000_000),
            sample_clock_min: Rational::new(2_900_000_000, 144),
            sample_clock_max: hz(12_000_000_000),
        }
    }

    /// Limits for a direction.
    pub fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::Rx => Self::rx(),
            Direction::Tx => Self::tx(),
        }
    }
}

/// Discrete settings of one datapath: rates and JESD204 framing.
#[derive(Clone, Debug, PartialEq)]
pub struct DataPath {
    direction: Direction,
    sample_clock: Rational,
    datapath_ratio: u32,
    class: JesdClass,
    params: JesdParams,
}

impl DataPath {
    /// A path at 245.76 MSPS in JESD204B quick mode `"0"`.
    ///
    /// Receive paths default to decimation 6, transmit paths to
    /// interpolation 12.
    pub fn new(direction: Direction) -> Result<Self, ModelError> {
        let datapath_ratio = match direction {
            Direction::Rx => 6,
            Direction::Tx => 12,
        };
        Ok(Self {
            direction,
            sample_clock: hz(245_760_000),
            datapath_ratio,
            class: JesdClass::Jesd204B,
            params: quick_mode(direction, JesdClass::Jesd204B, "0")?,
        })
    }

    /// Returns the direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the baseband sample clock.
    pub fn sample_clock(&self) -> Rational {
        self.sample_clock
    }

    /// Sets the baseband sample clock.
    pub fn set_sample_clock(&mut self, sample_clock: Rational) {
        self.sample_clock = sample_clock;
    }

    /// Returns the decimation (receive) or interpolation (transmit) factor.
    pub fn datapath_ratio(&self) -> u32 {
        self.datapath_ratio
    }

    /// Sets the decimation (receive) or interpolation (transmit) factor.
    pub fn set_datapath_ratio(&mut self, ratio: u32) {
        self.datapath_ratio = ratio;
    }

    /// Returns the JESD204 class.
    pub fn class(&self) -> JesdClass {
        self.class
    }

    /// Returns the JESD204 parameters.
    pub fn params(&self) -> &JesdParams {
        &self.params
    }

    /// Sets the JESD204 parameters directly.
    ///
    /// The tuple must still match a quick-configuration mode to validate.
    pub fn set_params(&mut self, class: JesdClass, params: JesdParams) {
        self.class = class;
        self.params = params;
    }

    /// Selects a quick-configuration mode, failing if it does not exist.
    pub fn set_quick_configuration_mode(
        &mut self,
        class: JesdClass,
        mode: &str,
    ) -> Result<(), ModelError> {
        self.params = quick_mode(self.direction, class, mode)?;
        self.class = class;
        Ok(())
    }

    /// Returns the quick-configuration mode matching the current parameters.
    pub fn quick_configuration_mode(&self) -> Option<&'static str> {
        mode_table()
            .ok()?
            .mode_id(self.direction, self.class, &self.params)
    }

    /// `datapath_ratio * sample_clock`: the ADC or DAC clock.
    pub fn converter_rate(&self) -> Rational {
        self.sample_clock * Rational::from_integer(i128::from(self.datapath_ratio))
    }

    /// The JESD204 link this path drives.
    pub fn link(&self, name: &str) -> JesdLink {
        JesdLink {
            name: name.to_string(),
            class: self.class,
            params: self.params,
            sample_clock: self.sample_clock,
        }
    }

    /// Checks the path's discrete settings against its limits and tables.
    pub fn validate(&self) -> Result<(), ModelError> {
        let dir = self.direction;
        let limits = PathLimits::for_direction(dir);
        check_rate(
            &format!("{dir} sample clock"),
            self.sample_clock,
            limits.sample_clock_min,
            limits.sample_clock_max,
        )?;
        let ratio_name = match dir {
            Direction::Rx => "decimation",
            Direction::Tx => "interpolation",
        };
        check_in_set(ratio_name, self.datapath_ratio, &DATAPATH_RATIOS)?;

        let p = &self.params;
        check_in_set("JESD204 M", p.m, &M_AVAILABLE)?;
        check_in_set("JESD204 L", p.l, &L_LANES_AVAILABLE)?;
        check_in_set("JESD204 N", p.n, &N_AVAILABLE)?;
        check_in_set("JESD204 Np", p.np, &NP_AVAILABLE)?;
        check_in_set("JESD204 F", p.f, &F_AVAILABLE)?;
        check_in_set("JESD204 S", p.s, &S_AVAILABLE)?;
        check_in_set("JESD204 K", p.k, &K_AVAILABLE)?;
        check_in_set("JESD204 CS", p.cs, &CS_AVAILABLE)?;
        check_in_set("JESD204 CF", p.cf, &CF_AVAILABLE)?;
        p.check_consistency()?;

        let (bit_min, bit_max) = bit_clock_range(self.class);
        check_rate(
            &format!("{dir} {} lane rate", self.class),
            self.link(dir.name()).bit_clock(),
            bit_min,
            bit_max,
        )?;

        if mode_table()?.mode_id(dir, self.class, p).is_none() {
            return Err(ModelError::InvalidConfiguration(format!(
                "{dir} {} parameters {} match no quick-configuration mode",
                self.class,
                p.to_json()
            )));
        }
        Ok(())
    }

    fn to_json(&self, link_name: &str) -> serde_json::Value {
        let mut link = self.link(link_name).to_json();
        if let Some(obj) = link.as_object_mut() {
            obj.insert(
                "quick_configuration_mode".to_string(),
                self.quick_configuration_mode().into(),
            );
            obj.insert("datapath_ratio".to_string(), self.datapath_ratio.into());
        }
        link
    }
}

/// The per-variant part of the clock tree: how the converter clock arises.
pub(crate) trait ConverterClockRelation {
    /// Registers `converter_clk` (and whatever feeds it) in `ns`.
    fn converter_clock_relation(
        &self,
        ns: &mut Namespace,
        model: &mut dyn Backend,
    ) -> Result<Expr, ModelError>;
}

/// PLL settings shared by every variant.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Clocking {
    pub(crate) option: ClockingOption,
    pub(crate) pll: PllLimits,
    pub(crate) converter_clock_range: (Rational, Rational),
}

impl Clocking {
    pub(crate) fn new(range: (Rational, Rational)) -> Self {
        Self {
            option: ClockingOption::IntegratedPll,
            pll: PllLimits::default(),
            converter_clock_range: range,
        }
    }

    /// Name of the clock the device needs at its clock input.
    pub(crate) fn input_clock_name(&self) -> &'static str {
        match self.option {
            ClockingOption::IntegratedPll => "ad9081_pll_ref",
            ClockingOption::Direct => "ad9081_dac_clock",
        }
    }

    /// Builds the converter clock via `relation`, then the PLL around it.
    ///
    /// Returns the PLL reference clock the device requests from upstream.
    pub(crate) fn pll_config(
        &self,
        relation: &dyn ConverterClockRelation,
        ns: &mut Namespace,
        model: &mut dyn Backend,
    ) -> Result<Expr, ModelError> {
        if self.option == ClockingOption::Direct {
            return Err(ModelError::NotImplemented(
                "AD9081 direct clocking".to_string(),
            ));
        }

        let converter_clk = relation.converter_clock_relation(ns, model)?;

        let m_vco = ns.variable(model, "m_vco", &Domain::integers(M_VCO_AVAILABLE))?;
        let n_vco = ns.variable(
            model,
            "n_vco",
            &Domain::integer_range(N_VCO_RANGE.0, N_VCO_RANGE.1),
        )?;
        let r = ns.variable(model, "r", &Domain::integers(R_AVAILABLE))?;
        let d = ns.variable(model, "d", &Domain::integers(D_AVAILABLE))?;

        let ref_clk = ns.derived(model, "ref_clk", &converter_clk * &d * &r / (&m_vco * &n_vco))?;
        let vco = ns.derived(model, "vco", &ref_clk * &m_vco * &n_vco / &r)?;

        let pll = &self.pll;
        constrain_range(model, &vco, pll.vco_min, pll.vco_max)?;
        constrain_range(model, &(&ref_clk / &r), pll.pfd_min, pll.pfd_max)?;
        let (cc_min, cc_max) = self.converter_clock_range;
        constrain_range(model, &converter_clk, cc_min, cc_max)?;

        Ok(ref_clk)
    }

    pub(crate) fn check(&self) -> Result<(), ModelError> {
        let (min, max) = self.converter_clock_range;
        if min > max {
            return Err(ModelError::InvalidConfiguration(format!(
                "converter clock range is empty: minimum {min} exceeds maximum {max}"
            )));
        }
        Ok(())
    }
}

/// Registers `sysref == multiframe_clock / divisor^2` under `prefix`.
pub(crate) fn sysref(
    ns: &mut Namespace,
    model: &mut dyn Backend,
    prefix: &str,
    link: &JesdLink,
) -> Result<Expr, ModelError> {
    let divisor = ns.variable(
        model,
        &format!("{prefix}lmfc_divisor_sysref"),
        &Domain::integer_range(LMFC_DIVISOR_RANGE.0, LMFC_DIVISOR_RANGE.1),
    )?;
    let multiframe = Expr::constant(link.multiframe_clock());
    ns.derived(
        model,
        &format!("{prefix}sysref"),
        multiframe / (&divisor * &divisor),
    )
}

/// Reads the PLL settings of a solved namespace.
pub(crate) fn pll_json(
    ns: &Namespace,
    model: &dyn Backend,
) -> Result<serde_json::Value, ModelError> {
    Ok(serde_json::json!({
        "m_vco": ns.json(model, "m_vco")?,
        "n_vco": ns.json(model, "n_vco")?,
        "r": ns.json(model, "r")?,
        "d": ns.json(model, "d")?,
        "vco": ns.json(model, "vco")?,
        "ref_clk": ns.json(model, "ref_clk")?,
    }))
}

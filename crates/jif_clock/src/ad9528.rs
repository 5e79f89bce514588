//! Analog Devices AD9528 JESD204B clock generator.
//!
//! A fixed VCXO feeds a two-stage PLL:
//!
//! ```text
//! vco            = vcxo / r1 * m1 * n2
//! channel output = vco / m1 / d
//! sysref output  = vcxo / (2 * k)
//! ```
//!
//! `r1`, `m1` and `n2` are shared by every output; each output gets its own
//! divider (`d` for channels, `k` for SYSREF). An output is a SYSREF output
//! when its name contains `sysref`.

use jif_common::{hz, rational_to_json, Rational};
use jif_model::{
    check_rate, constrain_range, ClockChip, ClockRequest, Device, ModelError, Namespace,
};
use jif_solver::{Backend, Constraint, Domain, Expr, SolverKind};
use tracing::debug;

/// Reference divider range.
pub const R1_RANGE: (i64, i64) = (1, 31);
/// VCO output divider values.
pub const M1_AVAILABLE: [i64; 3] = [3, 4, 5];
/// Feedback divider range.
pub const N2_RANGE: (i64, i64) = (1, 256);
/// Largest channel output divider.
pub const OUTPUT_DIVIDER_MAX: i64 = 256;
/// SYSREF divider range.
pub const SYSREF_K_RANGE: (i64, i64) = (1, 65_535);

/// Namespace scope and part name.
const NAME: &str = "ad9528";
const OUTPUT_PREFIX: &str = "output.";
const DIVIDER_SUFFIX: &str = ".divider";

/// Analog limits of the AD9528.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ad9528Limits {
    /// Lowest VCO frequency.
    pub vco_min: Rational,
    /// Highest VCO frequency.
    pub vco_max: Rational,
    /// Highest phase-detector frequency.
    pub pfd_max: Rational,
    /// Highest channel output frequency.
    pub output_max: Rational,
    /// Lowest accepted VCXO frequency.
    pub vcxo_min: Rational,
    /// Highest accepted VCXO frequency.
    pub vcxo_max: Rational,
}

impl Default for Ad9528Limits {
    fn default() -> Self {
        Self {
            vco_min: hz(3_450_000_000),
            vco_max: hz(4_025_000_000),
            pfd_max: hz(275_000_000),
            output_max: hz(1_250_000_000),
            vcxo_min: hz(10_000_000),
            vcxo_max: hz(500_000_000),
        }
    }
}

/// An AD9528 model driven by a fixed VCXO.
#[derive(Clone, Debug, PartialEq)]
pub struct Ad9528 {
    solver: SolverKind,
    vcxo: Rational,
    limits: Ad9528Limits,
    output_dividers: Vec<i64>,
    requested: Vec<(String, Rational)>,
}

/// Where an output's rate comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputSource {
    Vco,
    Sysref,
}

impl OutputSource {
    fn of(name: &str) -> Self {
        if name.to_ascii_lowercase().contains("sysref") {
            OutputSource::Sysref
        } else {
            OutputSource::Vco
        }
    }

    fn name(self) -> &'static str {
        match self {
            OutputSource::Vco => "vco",
            OutputSource::Sysref => "sysref",
        }
    }
}

impl Ad9528 {
    /// Creates a model with the given VCXO frequency.
    pub fn new(solver: SolverKind, vcxo: Rational) -> Self {
        Self {
            solver,
            vcxo,
            limits: Ad9528Limits::default(),
            output_dividers: (1..=OUTPUT_DIVIDER_MAX).collect(),
            requested: Vec::new(),
        }
    }

    /// Returns the VCXO frequency.
    pub fn vcxo(&self) -> Rational {
        self.vcxo
    }

    /// Returns the analog limits.
    pub fn limits(&self) -> &Ad9528Limits {
        &self.limits
    }

    /// Overrides the analog limits.
    pub fn set_limits(&mut self, limits: Ad9528Limits) {
        self.limits = limits;
    }

    /// Restricts the channel output dividers the solver may use.
    pub fn set_output_dividers(&mut self, dividers: Vec<i64>) {
        self.output_dividers = dividers;
    }

    /// Requests a fixed output rate, used when solving the chip on its own.
    pub fn request_output(&mut self, name: impl Into<String>, rate: Rational) {
        self.requested.push((name.into(), rate));
    }

    fn output_key(name: &str) -> String {
        format!("{OUTPUT_PREFIX}{name}")
    }

    fn divider_key(name: &str) -> String {
        format!("{OUTPUT_PREFIX}{name}{DIVIDER_SUFFIX}")
    }

    /// Names of the outputs registered in `ns`, in key order.
    fn output_names(ns: &Namespace) -> Vec<&str> {
        ns.keys()
            .filter_map(|key| key.strip_prefix(OUTPUT_PREFIX))
            .filter(|rest| !rest.ends_with(DIVIDER_SUFFIX))
            .collect()
    }

    fn connect_output(
        &self,
        ns: &mut Namespace,
        model: &mut dyn Backend,
        name: &str,
        rate: &Expr,
    ) -> Result<(), ModelError> {
        let key = Self::output_key(name);
        if ns.contains(&key) {
            return Err(ModelError::InvalidConfiguration(format!(
                "AD9528 output {name:?} is already connected"
            )));
        }
        let divider_key = Self::divider_key(name);
        let output = match OutputSource::of(name) {
            OutputSource::Sysref => {
                let k = ns.variable(
                    model,
                    &divider_key,
                    &Domain::integer_range(SYSREF_K_RANGE.0, SYSREF_K_RANGE.1),
                )?;
                ns.derived(model, &key, Expr::constant(self.vcxo) / (k * 2))?
            }
            OutputSource::Vco => {
                let d = ns.variable(
                    model,
                    &divider_key,
                    &Domain::integers(self.output_dividers.iter().copied()),
                )?;
                let vco = ns.get("vco")?.clone();
                let m1 = ns.get("m1")?.clone();
                let output = ns.derived(model, &key, vco / m1 / d)?;
                model.add_constraint(Constraint::at_most(&output, self.limits.output_max))?;
                output
            }
        };
        model.add_constraint(Constraint::equal(output, rate))?;
        debug!(device = NAME, output = name, "connected clock output");
        Ok(())
    }
}

impl Device for Ad9528 {
    fn name(&self) -> &str {
        NAME
    }

    fn solver(&self) -> SolverKind {
        self.solver
    }

    fn validate_config(&self) -> Result<(), ModelError> {
        let limits = &self.limits;
        check_rate("AD9528 vcxo", self.vcxo, limits.vcxo_min, limits.vcxo_max)?;
        if self.output_dividers.is_empty() {
            return Err(ModelError::InvalidConfiguration(
                "AD9528 output divider set is empty".to_string(),
            ));
        }
        if let Some(d) = self
            .output_dividers
            .iter()
            .find(|d| !(1..=OUTPUT_DIVIDER_MAX).contains(*d))
        {
            return Err(ModelError::InvalidConfiguration(format!(
                "AD9528 output divider {d} is outside [1, {OUTPUT_DIVIDER_MAX}]"
            )));
        }
        if let Some((name, _)) = self
            .requested
            .iter()
            .find(|(_, rate)| *rate <= Rational::from_integer(0))
        {
            return Err(ModelError::InvalidConfiguration(format!(
                "AD9528 output {name:?} must have a positive rate"
            )));
        }
        Ok(())
    }

    fn required_clock_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn required_clocks(&self, model: &mut dyn Backend) -> Result<ClockRequest, ModelError> {
        self.validate_config()?;
        let mut ns = Namespace::open(model, NAME)?;
        let vcxo = ns.constant("vcxo", self.vcxo);
        let r1 = ns.variable(model, "r1", &Domain::integer_range(R1_RANGE.0, R1_RANGE.1))?;
        let m1 = ns.variable(model, "m1", &Domain::integers(M1_AVAILABLE))?;
        let n2 = ns.variable(model, "n2", &Domain::integer_range(N2_RANGE.0, N2_RANGE.1))?;
        let pfd = ns.derived(model, "pfd", &vcxo / &r1)?;
        let vco = ns.derived(model, "vco", &pfd * &m1 * &n2)?;

        constrain_range(model, &vco, self.limits.vco_min, self.limits.vco_max)?;
        model.add_constraint(Constraint::at_most(&pfd, self.limits.pfd_max))?;

        for (name, rate) in &self.requested {
            self.connect_output(&mut ns, model, name, &Expr::constant(*rate))?;
        }
        debug!(
            device = NAME,
            outputs = self.requested.len(),
            variables = model.variable_count(),
            constraints = model.constraint_count(),
            "registered clock chip model"
        );
        Ok(ClockRequest {
            namespace: ns,
            clocks: Vec::new(),
        })
    }

    fn config(
        &self,
        ns: &Namespace,
        model: &dyn Backend,
    ) -> Result<serde_json::Value, ModelError> {
        let mut outputs = serde_json::Map::new();
        for name in Self::output_names(ns) {
            outputs.insert(
                name.to_string(),
                serde_json::json!({
                    "rate": ns.json(model, &Self::output_key(name))?,
                    "divider": ns.json(model, &Self::divider_key(name))?,
                    "source": OutputSource::of(name).name(),
                }),
            );
        }
        Ok(serde_json::json!({
            "vcxo": rational_to_json(&self.vcxo),
            "r1": ns.json(model, "r1")?,
            "m1": ns.json(model, "m1")?,
            "n2": ns.json(model, "n2")?,
            "pfd": ns.json(model, "pfd")?,
            "vco": ns.json(model, "vco")?,
            "output_clocks": outputs,
        }))
    }
}

impl ClockChip for Ad9528 {
    fn connect_outputs(
        &self,
        namespace: &mut Namespace,
        model: &mut dyn Backend,
        names: &[String],
        rates: &[Expr],
    ) -> Result<(), ModelError> {
        if names.len() != rates.len() {
            return Err(ModelError::InvalidConfiguration(format!(
                "{} output names given for {} requested rates",
                names.len(),
                rates.len()
            )));
        }
        for (name, rate) in names.iter().zip(rates) {
            self.connect_output(namespace, model, name, rate)?;
        }
        Ok(())
    }
}

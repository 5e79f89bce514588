//! JESD204 link parameters and the clock rates they imply.

use crate::error::ModelError;
use jif_common::{rational_to_json, Rational};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// JESD204 subclass revision, which fixes the line encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JesdClass {
    /// JESD204B with 8b/10b encoding.
    #[serde(rename = "jesd204b")]
    Jesd204B,
    /// JESD204C with 64b/66b encoding.
    #[serde(rename = "jesd204c")]
    Jesd204C,
}

impl JesdClass {
    /// Both classes.
    pub const ALL: [JesdClass; 2] = [JesdClass::Jesd204B, JesdClass::Jesd204C];

    /// Returns the canonical tag.
    pub fn name(self) -> &'static str {
        match self {
            JesdClass::Jesd204B => "jesd204b",
            JesdClass::Jesd204C => "jesd204c",
        }
    }

    /// Line-rate overhead of the encoding (10/8 or 66/64).
    pub fn encoding(self) -> Rational {
        match self {
            JesdClass::Jesd204B => Rational::new(10, 8),
            JesdClass::Jesd204C => Rational::new(66, 64),
        }
    }

    /// Ratio between lane rate and the link's device clock.
    pub fn device_clock_divisor(self) -> i128 {
        match self {
            JesdClass::Jesd204B => 40,
            JesdClass::Jesd204C => 66,
        }
    }
}

impl fmt::Display for JesdClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JesdClass {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jesd204b" | "204b" => Ok(JesdClass::Jesd204B),
            "jesd204c" | "204c" => Ok(JesdClass::Jesd204C),
            _ => Err(ModelError::InvalidConfiguration(format!(
                "unknown JESD204 class {s:?}; supported: jesd204b, jesd204c"
            ))),
        }
    }
}

fn one() -> u32 {
    1
}

/// The frame-structure parameters of one JESD204 link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JesdParams {
    /// Converters.
    #[serde(rename = "M")]
    pub m: u32,
    /// Lanes.
    #[serde(rename = "L")]
    pub l: u32,
    /// Converter resolution in bits.
    #[serde(rename = "N")]
    pub n: u32,
    /// Bits per sample, including control and tail bits.
    #[serde(rename = "Np")]
    pub np: u32,
    /// Octets per frame per lane.
    #[serde(rename = "F")]
    pub f: u32,
    /// Samples per converter per frame.
    #[serde(rename = "S")]
    pub s: u32,
    /// Frames per multiframe.
    #[serde(rename = "K")]
    pub k: u32,
    /// Control bits per sample.
    #[serde(rename = "CS")]
    pub cs: u32,
    /// Control words per frame.
    #[serde(rename = "CF")]
    pub cf: u32,
    /// Multiblocks per extended multiblock (JESD204C only).
    #[serde(rename = "E", default = "one")]
    pub e: u32,
}

impl JesdParams {
    /// Octets per frame implied by `M`, `S`, `Np` and `L`.
    ///
    /// Returns `None` if `L` is zero.
    pub fn implied_octets_per_frame(&self) -> Option<Rational> {
        if self.l == 0 {
            return None;
        }
        Some(Rational::new(
            i128::from(self.m) * i128::from(self.s) * i128::from(self.np),
            8 * i128::from(self.l),
        ))
    }

    /// Checks the internal consistency every JESD204 mode must satisfy.
    pub fn check_consistency(&self) -> Result<(), ModelError> {
        if self.s == 0 || self.k == 0 || self.e == 0 {
            return Err(ModelError::InvalidConfiguration(
                "JESD204 parameters S, K and E must be non-zero".to_string(),
            ));
        }
        let implied = self.implied_octets_per_frame().ok_or_else(|| {
            ModelError::InvalidConfiguration("JESD204 parameter L must be non-zero".to_string())
        })?;
        if implied != Rational::from_integer(i128::from(self.f)) {
            return Err(ModelError::InvalidConfiguration(format!(
                "F = {} does not match M*S*Np/(8*L) = {}",
                self.f, implied
            )));
        }
        if self.np < self.n {
            return Err(ModelError::InvalidConfiguration(format!(
                "Np = {} must be at least N = {}",
                self.np, self.n
            )));
        }
        Ok(())
    }

    /// Renders the parameters as a JSON object keyed by their JESD204 names.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "M": self.m, "L": self.l, "N": self.n, "Np": self.np, "F": self.f,
            "S": self.s, "K": self.k, "CS": self.cs, "CF": self.cf, "E": self.e,
        })
    }
}

/// One configured serial link between a converter and the FPGA.
#[derive(Clone, Debug, PartialEq)]
pub struct JesdLink {
    /// Link name, used as a prefix for the FPGA's clock names.
    pub name: String,
    /// Encoding class.
    pub class: JesdClass,
    /// Frame structure.
    pub params: JesdParams,
    /// Baseband sample clock in Hz.
    pub sample_clock: Rational,
}

impl JesdLink {
    /// `fs / S`
    pub fn frame_clock(&self) -> Rational {
        self.sample_clock / Rational::from_integer(i128::from(self.params.s.max(1)))
    }

    /// `frame / K` for JESD204B, `frame / (K * E)` for JESD204C.
    pub fn multiframe_clock(&self) -> Rational {
        let k = i128::from(self.params.k.max(1));
        let divisor = match self.class {
            JesdClass::Jesd204B => k,
            JesdClass::Jesd204C => k * i128::from(self.params.e.max(1)),
        };
        self.frame_clock() / Rational::from_integer(divisor)
    }

    /// Lane rate: `M * Np * fs / L` scaled by the encoding overhead.
    pub fn bit_clock(&self) -> Rational {
        let p = &self.params;
        let payload = Rational::from_integer(i128::from(p.m) * i128::from(p.np)) * self.sample_clock
            / Rational::from_integer(i128::from(p.l.max(1)));
        payload * self.class.encoding()
    }

    /// Link device clock: lane rate over 40 (204B) or 66 (204C).
    pub fn device_clock(&self) -> Rational {
        self.bit_clock() / Rational::from_integer(self.class.device_clock_divisor())
    }

    /// Renders the link's parameters and derived rates.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "class": self.class.name(),
            "params": self.params.to_json(),
            "sample_clock": rational_to_json(&self.sample_clock),
            "frame_clock": rational_to_json(&self.frame_clock()),
            "multiframe_clock": rational_to_json(&self.multiframe_clock()),
            "bit_clock": rational_to_json(&self.bit_clock()),
            "device_clock": rational_to_json(&self.device_clock()),
        })
    }
}

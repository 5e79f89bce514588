//! Xilinx multi-gigabit transceiver families, their PLLs and dev kits.

use jif_common::{hz, ratio, Rational};
use jif_model::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CPLL reference divider values.
pub const CPLL_M_AVAILABLE: [i64; 2] = [1, 2];
/// CPLL feedback divider `N1` values.
pub const CPLL_N1_AVAILABLE: [i64; 2] = [4, 5];
/// CPLL feedback divider `N2` values.
pub const CPLL_N2_AVAILABLE: [i64; 5] = [1, 2, 3, 4, 5];
/// QPLL reference divider values.
pub const QPLL_M_AVAILABLE: [i64; 4] = [1, 2, 3, 4];
/// Output (line-rate) divider values shared by both PLLs.
pub const OUT_DIV_AVAILABLE: [i64; 5] = [1, 2, 4, 8, 16];

/// A transceiver family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Transceiver {
    /// 7-series GTX.
    Gtxe2,
    /// UltraScale+ GTH.
    Gthe4,
    /// UltraScale+ GTY.
    Gtye4,
}

/// Frequency limits of one transceiver family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransceiverLimits {
    /// Reference clock range.
    pub ref_clock: (Rational, Rational),
    /// CPLL VCO range.
    pub cpll_vco: (Rational, Rational),
    /// QPLL VCO range.
    pub qpll_vco: (Rational, Rational),
    /// Lane rate range.
    pub lane_rate: (Rational, Rational),
}

impl Transceiver {
    /// Returns the primitive name, e.g. `"GTHE4"`.
    pub fn name(self) -> &'static str {
        match self {
            Transceiver::Gtxe2 => "GTXE2",
            Transceiver::Gthe4 => "GTHE4",
            Transceiver::Gtye4 => "GTYE4",
        }
    }

    /// Returns the family's frequency limits.
    pub fn limits(self) -> TransceiverLimits {
        match self {
            Transceiver::Gtxe2 => TransceiverLimits {
                ref_clock: (hz(60_000_000), hz(670_000_000)),
                cpll_vco: (hz(1_600_000_000), hz(3_300_000_000)),
                qpll_vco: (hz(5_930_000_000), hz(8_000_000_000)),
                lane_rate: (hz(500_000_000), hz(12_500_000_000)),
            },
            Transceiver::Gthe4 => TransceiverLimits {
                ref_clock: (hz(60_000_000), hz(820_000_000)),
                cpll_vco: (hz(2_000_000_000), hz(6_250_000_000)),
                qpll_vco: (hz(9_800_000_000), hz(16_375_000_000)),
                lane_rate: (hz(500_000_000), hz(16_375_000_000)),
            },
            Transceiver::Gtye4 => TransceiverLimits {
                ref_clock: (hz(60_000_000), hz(820_000_000)),
                cpll_vco: (hz(2_000_000_000), hz(6_250_000_000)),
                qpll_vco: (hz(9_800_000_000), hz(16_375_000_000)),
                lane_rate: (hz(500_000_000), ratio(103_125_000_000, 4)),
            },
        }
    }

    /// QPLL feedback divider values.
    pub fn qpll_n_available(self) -> Vec<i64> {
        match self {
            Transceiver::Gtxe2 => vec![16, 20, 32, 40, 64, 66, 80, 100],
            Transceiver::Gthe4 | Transceiver::Gtye4 => (16..=160).collect(),
        }
    }

    /// Whether the family runs 64b66b (JESD204C) links.
    pub fn supports_64b66b(self) -> bool {
        !matches!(self, Transceiver::Gtxe2)
    }
}

impl fmt::Display for Transceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which transceiver PLL drives the lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransceiverPll {
    /// Channel PLL: `vco = ref * n1 * n2 / m`, `lane = 2 * vco / d`.
    #[default]
    Cpll,
    /// Quad PLL: `vco = ref * n / m`, `lane = vco / d`.
    Qpll,
}

impl TransceiverPll {
    /// Returns `"cpll"` or `"qpll"`.
    pub fn name(self) -> &'static str {
        match self {
            TransceiverPll::Cpll => "cpll",
            TransceiverPll::Qpll => "qpll",
        }
    }
}

impl fmt::Display for TransceiverPll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransceiverPll {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpll" => Ok(TransceiverPll::Cpll),
            "qpll" | "qpll0" => Ok(TransceiverPll::Qpll),
            _ => Err(ModelError::InvalidConfiguration(format!(
                "transceiver PLL {s:?} is not supported; allowed values are [cpll, qpll]"
            ))),
        }
    }
}

/// A development board and the transceivers it carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevKit {
    /// Zynq-7000 ZC706.
    Zc706,
    /// Zynq UltraScale+ ZCU102.
    #[default]
    Zcu102,
    /// Virtex UltraScale+ VCU118.
    Vcu118,
}

impl DevKit {
    /// Every supported board.
    pub const ALL: [DevKit; 3] = [DevKit::Zc706, DevKit::Zcu102, DevKit::Vcu118];

    /// Returns the board name.
    pub fn name(self) -> &'static str {
        match self {
            DevKit::Zc706 => "zc706",
            DevKit::Zcu102 => "zcu102",
            DevKit::Vcu118 => "vcu118",
        }
    }

    /// Returns the board's transceiver family.
    pub fn transceiver(self) -> Transceiver {
        match self {
            DevKit::Zc706 => Transceiver::Gtxe2,
            DevKit::Zcu102 => Transceiver::Gthe4,
            DevKit::Vcu118 => Transceiver::Gtye4,
        }
    }
}

impl fmt::Display for DevKit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DevKit {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        DevKit::ALL
            .into_iter()
            .find(|kit| kit.name() == lower)
            .ok_or_else(|| {
                ModelError::InvalidConfiguration(format!(
                    "unknown FPGA dev kit: {s:?}. Supported: zc706, zcu102, vcu118"
                ))
            })
    }
}

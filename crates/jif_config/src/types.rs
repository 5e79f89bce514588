//! Plan types deserialized from `jif.toml`.

use jif_common::Frequency;
use jif_fpga::TransceiverPll;
use jif_model::JesdClass;
use serde::Deserialize;

/// A complete system plan.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanConfig {
    /// Which devices make up the system and which backend solves it.
    pub system: SystemSection,
    /// Converter datapath settings.
    #[serde(default)]
    pub converter: ConverterSection,
    /// Clock-chip settings.
    #[serde(default)]
    pub clock: ClockSection,
    /// FPGA settings.
    #[serde(default)]
    pub fpga: FpgaSection,
    /// Search settings.
    #[serde(default)]
    pub solve: SolveSection,
}

/// The `[system]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemSection {
    /// Backend tag: `intermediate` or `substitution`.
    #[serde(default = "default_solver")]
    pub solver: String,
    /// Frequency of the clock chip's VCXO.
    pub vcxo: Option<Frequency>,
    /// Converter part name.
    pub converter: String,
    /// Clock-chip part name.
    #[serde(default = "default_clock")]
    pub clock: String,
    /// FPGA development board.
    #[serde(default = "default_fpga")]
    pub fpga: String,
}

fn default_solver() -> String {
    "intermediate".to_string()
}

fn default_clock() -> String {
    "ad9528".to_string()
}

fn default_fpga() -> String {
    "zcu102".to_string()
}

/// Settings of one converter datapath. Unset fields keep the device default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathSection {
    /// Baseband sample clock.
    pub sample_clock: Option<Frequency>,
    /// Receive decimation factor.
    pub decimation: Option<u32>,
    /// Transmit interpolation factor.
    pub interpolation: Option<u32>,
    /// JESD204 class; defaults to JESD204B when a quick mode is given.
    pub jesd_class: Option<JesdClass>,
    /// Quick-configuration mode id.
    pub quick_mode: Option<String>,
}

/// The `[converter]` table.
///
/// Single-path converters read the path fields at the top level; the
/// dual-path AD9081 reads `[converter.rx]` and `[converter.tx]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConverterSection {
    /// Baseband sample clock.
    pub sample_clock: Option<Frequency>,
    /// Receive decimation factor.
    pub decimation: Option<u32>,
    /// Transmit interpolation factor.
    pub interpolation: Option<u32>,
    /// JESD204 class.
    pub jesd_class: Option<JesdClass>,
    /// Quick-configuration mode id.
    pub quick_mode: Option<String>,
    /// `integrated_pll` or `direct`.
    pub clocking_option: Option<String>,
    /// Receive path of a dual-path converter.
    pub rx: Option<PathSection>,
    /// Transmit path of a dual-path converter.
    pub tx: Option<PathSection>,
}

impl ConverterSection {
    /// The top-level path fields as a [`PathSection`].
    pub fn single_path(&self) -> PathSection {
        PathSection {
            sample_clock: self.sample_clock,
            decimation: self.decimation,
            interpolation: self.interpolation,
            jesd_class: self.jesd_class,
            quick_mode: self.quick_mode.clone(),
        }
    }

    pub(crate) fn has_single_path_fields(&self) -> bool {
        self.sample_clock.is_some()
            || self.decimation.is_some()
            || self.interpolation.is_some()
            || self.jesd_class.is_some()
            || self.quick_mode.is_some()
    }

    pub(crate) fn is_dual_path(&self) -> bool {
        self.rx.is_some() || self.tx.is_some()
    }

    pub(crate) fn mixes_layouts(&self) -> bool {
        self.is_dual_path() && self.has_single_path_fields()
    }
}

/// The `[clock]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClockSection {
    /// Largest channel output divider the solver may use.
    pub output_divider_max: Option<i64>,
}

/// The `[fpga]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FpgaSection {
    /// Transceiver PLL driving the lanes.
    #[serde(default)]
    pub pll: TransceiverPll,
    /// Also request each link's device clock from the clock chip.
    #[serde(default)]
    pub request_device_clock: bool,
}

/// The `[solve]` table.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SolveSection {
    /// Solver time limit in milliseconds; unbounded when absent.
    pub timeout_ms: Option<u64>,
}

impl PlanConfig {
    /// Returns a copy with every datapath's sample clock replaced.
    pub fn with_sample_clock(&self, sample_clock: Frequency) -> PlanConfig {
        let mut plan = self.clone();
        let converter = &mut plan.converter;
        if converter.is_dual_path() {
            for path in [&mut converter.rx, &mut converter.tx] {
                path.get_or_insert_with(PathSection::default).sample_clock = Some(sample_clock);
            }
        } else {
            converter.sample_clock = Some(sample_clock);
        }
        plan
    }
}

//! Plan resolution: turning a parsed plan into configured device models.

use crate::error::ConfigError;
use crate::types::{ConverterSection, PathSection, PlanConfig};
use jif_clock::{Ad9528, SUPPORTED_CLOCK_CHIPS};
use jif_converter::{
    Ad9081, Ad9081Rx, Ad9081Tx, ClockingOption, DataPath, Direction, SUPPORTED_CONVERTERS,
};
use jif_fpga::{DevKit, Xilinx};
use jif_model::{ClockChip, Converter, Fpga, JesdClass};
use jif_solver::{SolveOptions, SolverKind};
use jif_system::{DynSystem, System};
use tracing::debug;

impl PlanConfig {
    /// The backend named by `system.solver`.
    pub fn solver(&self) -> Result<SolverKind, ConfigError> {
        self.system
            .solver
            .parse::<SolverKind>()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Solver options from the `[solve]` table.
    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            timeout_ms: self.solve.timeout_ms,
        }
    }
}

/// Builds the system a plan describes, with every setting applied and checked.
///
/// Device-level validation runs here, so a plan that resolves is only left
/// with feasibility to decide.
pub fn resolve_system(plan: &PlanConfig) -> Result<DynSystem, ConfigError> {
    let solver = plan.solver()?;
    let converter = resolve_converter(plan, solver)?;
    let clock = resolve_clock(plan, solver)?;
    let fpga = resolve_fpga(plan, solver)?;
    let mut system = System::new(converter, clock, fpga);
    system.validate()?;
    debug!(
        converter = %plan.system.converter,
        clock = %plan.system.clock,
        fpga = %plan.system.fpga,
        solver = %solver,
        "resolved plan"
    );
    Ok(system)
}

fn resolve_converter(
    plan: &PlanConfig,
    solver: SolverKind,
) -> Result<Box<dyn Converter>, ConfigError> {
    let section = &plan.converter;
    let clocking = section
        .clocking_option
        .as_deref()
        .map(str::parse::<ClockingOption>)
        .transpose()?;
    let name = plan.system.converter.to_ascii_lowercase();
    match name.as_str() {
        "ad9081_rx" => {
            single_path_only(section, &name)?;
            let mut converter = Ad9081Rx::new(solver)?;
            apply_path(converter.path_mut(), &section.single_path())?;
            if let Some(option) = clocking {
                converter.set_clocking_option(option);
            }
            Ok(Box::new(converter))
        }
        "ad9081_tx" => {
            single_path_only(section, &name)?;
            let mut converter = Ad9081Tx::new(solver)?;
            apply_path(converter.path_mut(), &section.single_path())?;
            if let Some(option) = clocking {
                converter.set_clocking_option(option);
            }
            Ok(Box::new(converter))
        }
        "ad9081" => {
            if section.has_single_path_fields() {
                return Err(ConfigError::ValidationError(
                    "the dual-path ad9081 takes its settings from [converter.rx] and [converter.tx]"
                        .to_string(),
                ));
            }
            let mut converter = Ad9081::new(solver)?;
            if let Some(rx) = &section.rx {
                apply_path(converter.rx_mut(), rx)?;
            }
            if let Some(tx) = &section.tx {
                apply_path(converter.tx_mut(), tx)?;
            }
            if let Some(option) = clocking {
                converter.set_clocking_option(option);
            }
            Ok(Box::new(converter))
        }
        _ => Err(ConfigError::UnknownDevice {
            role: "converter",
            name: plan.system.converter.clone(),
            supported: SUPPORTED_CONVERTERS.join(", "),
        }),
    }
}

fn single_path_only(section: &ConverterSection, name: &str) -> Result<(), ConfigError> {
    if section.is_dual_path() {
        return Err(ConfigError::ValidationError(format!(
            "{name} has a single datapath; [converter.rx]/[converter.tx] only apply to ad9081"
        )));
    }
    Ok(())
}

/// Applies the set fields of `section` to `path`.
fn apply_path(path: &mut DataPath, section: &PathSection) -> Result<(), ConfigError> {
    let direction = path.direction();
    if let Some(sample_clock) = section.sample_clock {
        path.set_sample_clock(sample_clock.rational());
    }
    let (ratio, misplaced) = match direction {
        Direction::Rx => (section.decimation, section.interpolation.map(|_| "interpolation")),
        Direction::Tx => (section.interpolation, section.decimation.map(|_| "decimation")),
    };
    if let Some(field) = misplaced {
        return Err(ConfigError::ValidationError(format!(
            "{field} does not apply to a {direction} datapath"
        )));
    }
    if let Some(ratio) = ratio {
        path.set_datapath_ratio(ratio);
    }
    match (&section.quick_mode, section.jesd_class) {
        (Some(mode), class) => {
            path.set_quick_configuration_mode(class.unwrap_or(JesdClass::Jesd204B), mode)?
        }
        (None, Some(class)) if class != path.class() => {
            return Err(ConfigError::MissingField(format!(
                "quick_mode for the {direction} {class} link"
            )));
        }
        (None, _) => {}
    }
    Ok(())
}

fn resolve_clock(plan: &PlanConfig, solver: SolverKind) -> Result<Box<dyn ClockChip>, ConfigError> {
    let vcxo = plan
        .system
        .vcxo
        .ok_or_else(|| ConfigError::MissingField("system.vcxo".to_string()))?;
    match plan.system.clock.to_ascii_lowercase().as_str() {
        "ad9528" => {
            let mut chip = Ad9528::new(solver, vcxo.rational());
            if let Some(max) = plan.clock.output_divider_max {
                chip.set_output_dividers((1..=max).collect());
            }
            Ok(Box::new(chip))
        }
        _ => Err(ConfigError::UnknownDevice {
            role: "clock",
            name: plan.system.clock.clone(),
            supported: SUPPORTED_CLOCK_CHIPS.join(", "),
        }),
    }
}

fn resolve_fpga(plan: &PlanConfig, solver: SolverKind) -> Result<Box<dyn Fpga>, ConfigError> {
    let kit = plan
        .system
        .fpga
        .parse::<DevKit>()
        .map_err(|_| ConfigError::UnknownDevice {
            role: "fpga",
            name: plan.system.fpga.clone(),
            supported: DevKit::ALL.map(DevKit::name).join(", "),
        })?;
    let mut fpga = Xilinx::new(solver, kit);
    fpga.set_pll(plan.fpga.pll);
    fpga.set_request_device_clock(plan.fpga.request_device_clock);
    Ok(Box::new(fpga))
}

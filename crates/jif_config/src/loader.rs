//! Plan file loading and validation.

use crate::error::ConfigError;
use crate::types::PlanConfig;
use std::path::Path;

/// Loads and validates a plan file.
pub fn load_plan(path: &Path) -> Result<PlanConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_plan_from_str(&content)
}

/// Parses and validates a plan from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_plan_from_str(content: &str) -> Result<PlanConfig, ConfigError> {
    let plan: PlanConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_plan(&plan)?;
    Ok(plan)
}

/// Checks the plan's shape; device-level checks happen during resolution.
fn validate_plan(plan: &PlanConfig) -> Result<(), ConfigError> {
    if plan.system.converter.is_empty() {
        return Err(ConfigError::MissingField("system.converter".to_string()));
    }
    if plan.system.vcxo.is_none() {
        return Err(ConfigError::MissingField("system.vcxo".to_string()));
    }
    if plan.converter.mixes_layouts() {
        return Err(ConfigError::ValidationError(
            "[converter] sets path fields alongside [converter.rx]/[converter.tx]".to_string(),
        ));
    }
    if plan.clock.output_divider_max.is_some_and(|max| max < 1) {
        return Err(ConfigError::ValidationError(
            "clock.output_divider_max must be at least 1".to_string(),
        ));
    }
    if plan.solve.timeout_ms == Some(0) {
        return Err(ConfigError::ValidationError(
            "solve.timeout_ms must be positive".to_string(),
        ));
    }
    Ok(())
}

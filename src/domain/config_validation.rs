//! Configuration validation.
//!
//! Checks every pipeline setting up front so a run never fails halfway on a
//! bad value. Keys that are absent fall back to their defaults; keys that are
//! present must parse.

use crate::domain::error::SigbenchError;
use crate::domain::label::LabelMode;
use crate::domain::ohlcv::PriceField;
use crate::ports::config_port::ConfigPort;
use std::str::FromStr;

pub fn validate_pipeline_config(config: &dyn ConfigPort) -> Result<(), SigbenchError> {
    validate_symbol(config)?;
    validate_label(config)?;
    validate_test_size(config)?;
    validate_non_negative(config, "model", "momentum_threshold")?;
    validate_non_negative(config, "backtest", "cost")?;
    validate_max_lag(config)?;
    validate_run_id(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SigbenchError {
    SigbenchError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Present value parsed as `T`; `None` when the key is absent or blank.
pub fn parse_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, SigbenchError> {
    match config.get_string(section, key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("cannot parse '{}'", raw.trim()))),
        _ => Ok(None),
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), SigbenchError> {
    match config.get_string("data", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SigbenchError::ConfigMissing {
            section: "data".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_label(config: &dyn ConfigPort) -> Result<(), SigbenchError> {
    if let Some(horizon) = parse_value::<i64>(config, "label", "horizon")? {
        if horizon < 1 {
            return Err(invalid("label", "horizon", "horizon must be at least 1"));
        }
    }
    validate_non_negative(config, "label", "threshold")?;
    if let Some(target) = config.get_string("label", "target") {
        PriceField::from_str(&target)
            .map_err(|_| invalid("label", "target", format!("unknown price field '{}'", target.trim())))?;
    }
    if let Some(mode) = config.get_string("label", "mode") {
        LabelMode::from_str(&mode)
            .map_err(|_| invalid("label", "mode", "mode must be binary or multiclass"))?;
    }
    Ok(())
}

fn validate_test_size(config: &dyn ConfigPort) -> Result<(), SigbenchError> {
    if let Some(value) = parse_value::<f64>(config, "split", "test_size")? {
        if !(value > 0.0 && value < 1.0) {
            return Err(invalid(
                "split",
                "test_size",
                "test_size must be between 0 and 1 (exclusive)",
            ));
        }
    }
    Ok(())
}

fn validate_non_negative(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), SigbenchError> {
    if let Some(value) = parse_value::<f64>(config, section, key)? {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(section, key, format!("{key} must be non-negative")));
        }
    }
    Ok(())
}

fn validate_max_lag(config: &dyn ConfigPort) -> Result<(), SigbenchError> {
    if let Some(value) = parse_value::<i64>(config, "analysis", "max_lag")? {
        if value < 1 {
            return Err(invalid("analysis", "max_lag", "max_lag must be at least 1"));
        }
    }
    Ok(())
}

// run_id ends up in output file names
fn validate_run_id(config: &dyn ConfigPort) -> Result<(), SigbenchError> {
    if let Some(run_id) = config.get_string("output", "run_id") {
        let run_id = run_id.trim();
        if !run_id.is_empty()
            && !run_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid(
                "output",
                "run_id",
                "run_id may only contain letters, digits, '_' and '-'",
            ));
        }
    }
    Ok(())
}

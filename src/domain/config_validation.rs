//! Configuration validation.
//!
//! Every key is optional (defaults apply), but a value that is present must
//! be well formed.

use crate::domain::error::TradelogicError;
use crate::ports::config_port::ConfigPort;

pub const SOURCES: [&str; 3] = ["csv", "sqlite", "yahoo"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradelogicError> {
    validate_ticker(config)?;
    validate_window(config, "short_window")?;
    validate_window(config, "long_window")?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TradelogicError> {
    let source = match config.get_string("data", "source") {
        Some(s) => s.trim().to_lowercase(),
        None => return Ok(()),
    };

    if !SOURCES.contains(&source.as_str()) {
        return Err(TradelogicError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: format!("unknown source '{}', expected one of {}", source, SOURCES.join(", ")),
        });
    }

    if source == "sqlite" {
        require_non_empty(config, "sqlite", "path")?;
    }

    if source == "yahoo" && config.get_int("yahoo", "timeout_secs", 30) < 1 {
        return Err(TradelogicError::ConfigInvalid {
            section: "yahoo".to_string(),
            key: "timeout_secs".to_string(),
            reason: "timeout_secs must be at least 1".to_string(),
        });
    }

    Ok(())
}

fn validate_ticker(config: &dyn ConfigPort) -> Result<(), TradelogicError> {
    match config.get_string("backtest", "ticker") {
        Some(s) if s.trim().is_empty() => Err(TradelogicError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "ticker".to_string(),
            reason: "ticker must not be empty".to_string(),
        }),
        _ => Ok(()),
    }
}

fn validate_window(config: &dyn ConfigPort, key: &str) -> Result<(), TradelogicError> {
    let raw = match config.get_string("backtest", key) {
        Some(s) => s,
        None => return Ok(()),
    };

    let value: i64 = raw.trim().parse().map_err(|_| TradelogicError::ConfigInvalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: format!("{} must be an integer, got '{}'", key, raw.trim()),
    })?;

    if value < 1 {
        return Err(TradelogicError::InvalidWindow {
            name: key.to_string(),
            value,
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TradelogicError> {
    config.get_date("backtest", "start_date")?;
    config.get_date("backtest", "end_date")?;
    Ok(())
}

fn require_non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), TradelogicError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(TradelogicError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

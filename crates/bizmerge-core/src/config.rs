use std::path::PathBuf;

use crate::app_config::{
    AppConfig, Environment, IntegritySettings, LevelThresholds, ReconcileSettings,
    SelectionPolicy,
};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_unit = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw
            .parse::<f64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })?;
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("{value} is outside [0, 1]"),
            })
        }
    };

    let parse_weight = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw
            .parse::<f64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("{value} must be a positive number"),
            })
        }
    };

    let env = parse_environment(&or_default("BIZMERGE_ENV", "development"))?;
    let log_level = or_default("BIZMERGE_LOG_LEVEL", "info");
    let fixtures_path = PathBuf::from(or_default(
        "BIZMERGE_FIXTURES_PATH",
        "./config/businesses.yaml",
    ));

    let reconcile = ReconcileSettings {
        max_variations: parse_usize("BIZMERGE_MAX_VARIATIONS", "5")?,
        high_severity_below: parse_unit("BIZMERGE_SEVERITY_HIGH_BELOW", "0.3")?,
        medium_severity_below: parse_unit("BIZMERGE_SEVERITY_MEDIUM_BELOW", "0.6")?,
    };
    if reconcile.high_severity_below > reconcile.medium_severity_below {
        return Err(ConfigError::InvalidEnvVar {
            var: "BIZMERGE_SEVERITY_HIGH_BELOW".to_string(),
            reason: "must not exceed BIZMERGE_SEVERITY_MEDIUM_BELOW".to_string(),
        });
    }

    let levels = LevelThresholds {
        high: parse_unit("BIZMERGE_LEVEL_HIGH", "0.9")?,
        medium: parse_unit("BIZMERGE_LEVEL_MEDIUM", "0.7")?,
        low: parse_unit("BIZMERGE_LEVEL_LOW", "0.5")?,
    };
    if !(levels.high >= levels.medium && levels.medium >= levels.low) {
        return Err(ConfigError::InvalidEnvVar {
            var: "BIZMERGE_LEVEL_MEDIUM".to_string(),
            reason: "level thresholds must satisfy high >= medium >= low".to_string(),
        });
    }

    let integrity = IntegritySettings {
        min_integrity_score: parse_unit("BIZMERGE_INTEGRITY_MIN_SCORE", "0.7")?,
        issue_weight: parse_weight("BIZMERGE_INTEGRITY_ISSUE_WEIGHT", "0.5")?,
        warning_weight: parse_weight("BIZMERGE_INTEGRITY_WARNING_WEIGHT", "0.1")?,
        low_consistency_warning_below: parse_unit(
            "BIZMERGE_INTEGRITY_LOW_CONSISTENCY_BELOW",
            "0.7",
        )?,
    };
    if integrity.warning_weight >= integrity.issue_weight {
        return Err(ConfigError::InvalidEnvVar {
            var: "BIZMERGE_INTEGRITY_WARNING_WEIGHT".to_string(),
            reason: "must be below BIZMERGE_INTEGRITY_ISSUE_WEIGHT".to_string(),
        });
    }

    let selection_policy =
        parse_selection_policy(&or_default("BIZMERGE_SELECTION_STRATEGY", "first_non_empty"))?;

    let max_concurrent_extractions = parse_usize("BIZMERGE_MAX_CONCURRENT_EXTRACTIONS", "4")?;

    Ok(AppConfig {
        env,
        log_level,
        fixtures_path,
        reconcile,
        levels,
        integrity,
        selection_policy,
        max_concurrent_extractions,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for values other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BIZMERGE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_selection_policy(s: &str) -> Result<SelectionPolicy, ConfigError> {
    match s {
        "first_non_empty" => Ok(SelectionPolicy::FirstNonEmpty),
        "highest_confidence" => Ok(SelectionPolicy::HighestConfidence),
        "most_recent" => Ok(SelectionPolicy::MostRecent),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BIZMERGE_SELECTION_STRATEGY".to_string(),
            reason: format!("unknown selection strategy '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

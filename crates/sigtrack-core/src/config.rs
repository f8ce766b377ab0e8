use crate::app_config::AppConfig;
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
/// Every variable is optional. An empty `SLACK_WEBHOOK_URL` counts as unset so
/// that escalations take the local fallback path.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let defaults = AppConfig::default();

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        optional(var).map_or(Ok(default), |raw| {
            raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
        })
    };

    let parse_u32 = |var: &str, default: u32| -> Result<u32, ConfigError> {
        optional(var).map_or(Ok(default), |raw| {
            raw.parse::<u32>().map_err(|e| invalid(var, e.to_string()))
        })
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        optional(var).map_or(Ok(default), |raw| {
            parse_flag(&raw)
                .ok_or_else(|| invalid(var, format!("expected a boolean, got \"{raw}\"")))
        })
    };

    let data_dir = PathBuf::from(or_default(
        "SIGTRACK_DATA_DIR",
        &defaults.data_dir.to_string_lossy(),
    ));
    let slack_webhook_url = optional("SLACK_WEBHOOK_URL");
    let log_level = or_default("SIGTRACK_LOG_LEVEL", &defaults.log_level);
    let app_name = or_default("SIGTRACK_APP_NAME", &defaults.app_name);
    let app_version = or_default("SIGTRACK_APP_VERSION", &defaults.app_version);
    let agent_name = or_default("SIGTRACK_AGENT_NAME", &defaults.agent_name);
    let header_name = or_default("SIGTRACK_HEADER_NAME", &defaults.header_name);

    let slack_timeout_secs =
        parse_u64("SIGTRACK_SLACK_TIMEOUT_SECS", defaults.slack_timeout_secs)?;
    let slack_max_attempts =
        parse_u32("SIGTRACK_SLACK_MAX_ATTEMPTS", defaults.slack_max_attempts)?;
    if slack_max_attempts == 0 {
        return Err(invalid(
            "SIGTRACK_SLACK_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let slack_backoff_initial_ms = parse_u64(
        "SIGTRACK_SLACK_BACKOFF_INITIAL_MS",
        defaults.slack_backoff_initial_ms,
    )?;
    let slack_backoff_max_ms =
        parse_u64("SIGTRACK_SLACK_BACKOFF_MAX_MS", defaults.slack_backoff_max_ms)?;
    let fallback_on_delivery_failure = parse_bool(
        "SIGTRACK_FALLBACK_ON_DELIVERY_FAILURE",
        defaults.fallback_on_delivery_failure,
    )?;

    Ok(AppConfig {
        data_dir,
        slack_webhook_url,
        log_level,
        app_name,
        app_version,
        agent_name,
        header_name,
        slack_timeout_secs,
        slack_max_attempts,
        slack_backoff_initial_ms,
        slack_backoff_max_ms,
        fallback_on_delivery_failure,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

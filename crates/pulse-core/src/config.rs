use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let company = require("PULSE_COMPANY")?;
    let output_root = PathBuf::from(or_default("PULSE_OUTPUT_ROOT", "./output"));
    let sources_path = PathBuf::from(or_default("PULSE_SOURCES_PATH", "./config/sources.yaml"));
    let log_level = or_default("PULSE_LOG_LEVEL", "info");

    let tz_offset_hours: i32 = parse_var(&or_default, "PULSE_TZ_OFFSET_HOURS", "8")?;
    if !(-12..=14).contains(&tz_offset_hours) {
        return Err(ConfigError::InvalidEnvVar {
            var: "PULSE_TZ_OFFSET_HOURS".to_string(),
            reason: format!("{tz_offset_hours} is outside -12..=14"),
        });
    }

    let batch_size: usize = parse_var(&or_default, "PULSE_BATCH_SIZE", "100")?;
    if batch_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PULSE_BATCH_SIZE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let page_size: u32 = parse_var(&or_default, "PULSE_PAGE_SIZE", "100")?;
    let reply_depth: u8 = parse_var(&or_default, "PULSE_REPLY_DEPTH", "1")?;
    let max_pages = parse_optional::<usize, _>(&optional, "PULSE_MAX_PAGES")?;
    let http_timeout_secs: u64 = parse_var(&or_default, "PULSE_HTTP_TIMEOUT_SECS", "60")?;
    let user_agent = or_default("PULSE_USER_AGENT", "pulse/0.1 (social-harvest)");
    let retry_delay_secs: u64 = parse_var(&or_default, "PULSE_RETRY_DELAY_SECS", "5")?;
    let retry_max_attempts = parse_optional::<u32, _>(&optional, "PULSE_RETRY_MAX_ATTEMPTS")?;

    let nlp_base_url = or_default("PULSE_NLP_BASE_URL", "http://api.bosonnlp.com");
    let nlp_tokens = optional("PULSE_NLP_TOKENS")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let nlp_top_k: usize = parse_var(&or_default, "PULSE_NLP_TOP_K", "3")?;

    Ok(AppConfig {
        company,
        output_root,
        sources_path,
        log_level,
        tz_offset_hours,
        batch_size,
        page_size,
        reply_depth,
        max_pages,
        http_timeout_secs,
        user_agent,
        retry_delay_secs,
        retry_max_attempts,
        nlp_base_url,
        nlp_tokens,
        nlp_top_k,
        facebook_access_token: optional("FACEBOOK_ACCESS_TOKEN"),
        twitter_bearer_token: optional("TWITTER_BEARER_TOKEN"),
        instagram_access_token: optional("INSTAGRAM_ACCESS_TOKEN"),
        linkedin_access_token: optional("LINKEDIN_ACCESS_TOKEN"),
    })
}

fn parse_var<T, D>(or_default: &D, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    D: Fn(&str, &str) -> String,
{
    let raw = or_default(var, default);
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

fn parse_optional<T, O>(optional: &O, var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    O: Fn(&str) -> Option<String>,
{
    optional(var)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

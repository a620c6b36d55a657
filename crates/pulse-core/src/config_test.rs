use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("PULSE_COMPANY", "tigersugar");
    m
}

#[test]
fn build_app_config_fails_without_company() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "PULSE_COMPANY"),
        "expected MissingEnvVar(PULSE_COMPANY), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_blank_company() {
    let mut map = full_env();
    map.insert("PULSE_COMPANY", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
}

#[test]
fn build_app_config_applies_defaults() {
    let map = full_env();
    let config = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(config.company, "tigersugar");
    assert_eq!(config.tz_offset_hours, 8);
    assert_eq!(config.batch_size, 100);
    assert_eq!(config.page_size, 100);
    assert_eq!(config.reply_depth, 1);
    assert_eq!(config.retry_delay_secs, 5);
    assert_eq!(config.retry_max_attempts, None);
    assert_eq!(config.max_pages, None);
    assert_eq!(config.nlp_top_k, 3);
    assert!(config.nlp_tokens.is_empty());
    assert_eq!(config.log_level, "info");
    assert!(config.facebook_access_token.is_none());
}

#[test]
fn company_dir_joins_output_root() {
    let mut map = full_env();
    map.insert("PULSE_OUTPUT_ROOT", "/data/out");
    let config = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        config.company_dir(),
        std::path::PathBuf::from("/data/out/tigersugar")
    );
}

#[test]
fn nlp_tokens_are_split_and_trimmed() {
    let mut map = full_env();
    map.insert("PULSE_NLP_TOKENS", " a.1 , b.2,,c.3 ");
    let config = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(config.nlp_tokens, vec!["a.1", "b.2", "c.3"]);
}

#[test]
fn retry_max_attempts_parses_when_set() {
    let mut map = full_env();
    map.insert("PULSE_RETRY_MAX_ATTEMPTS", "4");
    let config = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(config.retry_max_attempts, Some(4));
}

#[test]
fn invalid_retry_max_attempts_is_rejected() {
    let mut map = full_env();
    map.insert("PULSE_RETRY_MAX_ATTEMPTS", "many");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PULSE_RETRY_MAX_ATTEMPTS"),
        "got: {result:?}"
    );
}

#[test]
fn zero_batch_size_is_rejected() {
    let mut map = full_env();
    map.insert("PULSE_BATCH_SIZE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PULSE_BATCH_SIZE"),
        "got: {result:?}"
    );
}

#[test]
fn out_of_range_tz_offset_is_rejected() {
    let mut map = full_env();
    map.insert("PULSE_TZ_OFFSET_HOURS", "15");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PULSE_TZ_OFFSET_HOURS"),
        "got: {result:?}"
    );
}

#[test]
fn negative_tz_offset_is_accepted() {
    let mut map = full_env();
    map.insert("PULSE_TZ_OFFSET_HOURS", "-5");
    let config = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(config.tz_offset_hours, -5);
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = full_env();
    map.insert("FACEBOOK_ACCESS_TOKEN", "super-secret");
    map.insert("PULSE_NLP_TOKENS", "tok-a,tok-b");
    let config = build_app_config(lookup_from_map(&map)).unwrap();
    let debug = format!("{config:?}");
    assert!(!debug.contains("super-secret"));
    assert!(!debug.contains("tok-a"));
    assert!(debug.contains("[redacted]"));
}

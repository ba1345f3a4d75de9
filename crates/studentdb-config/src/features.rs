//! Service capability toggles.
//!
//! Authentication and caching can be switched on and off independently, so a
//! single binary covers the open, authenticated, cached and uncached variants.
//!
//! # Environment Variables
//!
//! - `AUTH_ENABLED`: require a bearer token on student endpoints (default: `true`)
//! - `AUTH_ENFORCE_READ_ONLY`: reject writes from read-only accounts (default: `false`)
//! - `METRICS_ENABLED`: install the Prometheus recorder and `/metrics` (default: `true`)
//! - `LOW_SCORE_THRESHOLD`: exclusive upper bound for the low-score query (default: `30`)
//! - `SERVER_ADDR`: listen address (default: `0.0.0.0:8000`)

use std::env;

pub const DEFAULT_LOW_SCORE_THRESHOLD: i32 = 30;

#[derive(Clone, Debug)]
pub struct FeatureConfig {
    pub auth_enabled: bool,
    pub enforce_read_only: bool,
    pub metrics_enabled: bool,
    pub low_score_threshold: i32,
    pub server_addr: String,
}

impl FeatureConfig {
    pub fn from_env() -> Self {
        Self {
            auth_enabled: env_flag("AUTH_ENABLED", true),
            enforce_read_only: env_flag("AUTH_ENFORCE_READ_ONLY", false),
            metrics_enabled: env_flag("METRICS_ENABLED", true),
            low_score_threshold: env::var("LOW_SCORE_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LOW_SCORE_THRESHOLD),
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            auth_enabled: true,
            enforce_read_only: false,
            metrics_enabled: false,
            low_score_threshold: DEFAULT_LOW_SCORE_THRESHOLD,
            server_addr: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Reads a boolean flag. `false`, `0`, `no` and `off` disable it; anything else enables it.
pub fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => parse_flag(&value).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" => None,
        "false" | "0" | "no" | "off" => Some(false),
        _ => Some(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("OFF"), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("  "), None);
    }

    #[test]
    fn test_defaults() {
        let config = FeatureConfig::default();
        assert!(config.auth_enabled);
        assert!(!config.enforce_read_only);
        assert_eq!(config.low_score_threshold, 30);
    }
}

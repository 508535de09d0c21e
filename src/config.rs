//! Configuration types.

use crate::error::ConfigError;

/// Base URL used when `QUIZ_API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct QuizConfig {
    /// Base URL of the recommendation service, without a trailing slash.
    pub api_base_url: String,
    /// Skip the `/health` probe at startup.
    pub skip_health_check: bool,
}

impl QuizConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = match lookup("QUIZ_API_BASE_URL") {
            Some(raw) => normalize_base_url(&raw)?,
            None => DEFAULT_API_BASE_URL.to_string(),
        };

        let skip_health_check = match lookup("QUIZ_SKIP_HEALTH") {
            Some(raw) => parse_bool("QUIZ_SKIP_HEALTH", &raw)?,
            None => false,
        };

        Ok(Self {
            api_base_url,
            skip_health_check,
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            key: "QUIZ_API_BASE_URL".to_string(),
            message: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = QuizConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(!config.skip_health_check);
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let config =
            QuizConfig::from_lookup(lookup_from(&[("QUIZ_API_BASE_URL", "https://quiz.example/api//")]))
                .unwrap();
        assert_eq!(config.api_base_url, "https://quiz.example/api");
    }

    #[test]
    fn rejects_non_http_url() {
        let err = QuizConfig::from_lookup(lookup_from(&[("QUIZ_API_BASE_URL", "ftp://nope")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "QUIZ_API_BASE_URL"));
    }

    #[test]
    fn parses_skip_health_flag() {
        let config = QuizConfig::from_lookup(lookup_from(&[("QUIZ_SKIP_HEALTH", "Yes")])).unwrap();
        assert!(config.skip_health_check);

        let err = QuizConfig::from_lookup(lookup_from(&[("QUIZ_SKIP_HEALTH", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("QUIZ_SKIP_HEALTH"));
    }
}

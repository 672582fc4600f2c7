//! Environment-driven configuration
//!
//! The only required setting is the Deepgram API key. Duration and model
//! have defaults matching the hosted service's stable general-purpose model.

use std::time::Duration;

pub const DEFAULT_MAX_DURATION_SECS: u64 = 120;
pub const DEFAULT_MODEL: &str = "nova-3";

const API_KEY_VAR: &str = "DEEPGRAM_API_KEY";
const MAX_DURATION_VAR: &str = "VOX_MAX_DURATION";
const MODEL_VAR: &str = "VOX_DEEPGRAM_MODEL";

/// Errors detected before any capture starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingApiKey,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingApiKey => {
                write!(f, "{} environment variable is not set", API_KEY_VAR)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub max_duration: Duration,
    pub model: String,
    /// Echo the raw API response to stderr.
    pub debug: bool,
}

impl Config {
    /// Read configuration from the environment. Fails only on a missing
    /// credential; malformed optional values fall back to their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            api_key,
            max_duration: parse_max_duration(std::env::var(MAX_DURATION_VAR).ok()),
            model: parse_model(std::env::var(MODEL_VAR).ok()),
            debug: false,
        })
    }
}

fn parse_max_duration(raw: Option<String>) -> Duration {
    let secs = match raw {
        None => DEFAULT_MAX_DURATION_SECS,
        Some(value) => match value.parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                log::warn!(
                    "Ignoring invalid {}={:?}, using {} seconds",
                    MAX_DURATION_VAR,
                    value,
                    DEFAULT_MAX_DURATION_SECS
                );
                DEFAULT_MAX_DURATION_SECS
            }
        },
    };
    Duration::from_secs(secs)
}

fn parse_model(raw: Option<String>) -> String {
    raw.filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_duration_defaults_to_120() {
        assert_eq!(parse_max_duration(None), Duration::from_secs(120));
    }

    #[test]
    fn test_max_duration_parses_seconds() {
        assert_eq!(
            parse_max_duration(Some("45".to_string())),
            Duration::from_secs(45)
        );
    }

    #[test]
    fn test_max_duration_rejects_garbage_and_zero() {
        assert_eq!(
            parse_max_duration(Some("soon".to_string())),
            Duration::from_secs(120)
        );
        assert_eq!(
            parse_max_duration(Some("0".to_string())),
            Duration::from_secs(120)
        );
        assert_eq!(
            parse_max_duration(Some("-5".to_string())),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn test_model_defaults() {
        assert_eq!(parse_model(None), "nova-3");
        assert_eq!(parse_model(Some(String::new())), "nova-3");
        assert_eq!(parse_model(Some("nova-2".to_string())), "nova-2");
    }
}

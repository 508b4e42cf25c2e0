//! Typed settings read from the environment (after `load_and_apply`).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_DATABASE: &str = "tally.db";
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_FAILURES: u32 = 3;

#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for the CLI and the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `OPENAI_API_KEY`; required only for the real LLM.
    pub openai_api_key: Option<String>,
    /// `OPENAI_BASE_URL`, for OpenAI-compatible endpoints.
    pub openai_base_url: Option<String>,
    /// `TALLY_MODEL`.
    pub model: String,
    /// `TALLY_TEMPERATURE`.
    pub temperature: f32,
    /// `TALLY_DATABASE`: SQLite file with the e-commerce tables.
    pub database: PathBuf,
    /// `TALLY_CALL_TIMEOUT_SECS`: deadline per LLM or warehouse call.
    pub call_timeout: Duration,
    /// `TALLY_MAX_FAILURES`: retry ceiling.
    pub max_failures: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            database: PathBuf::from(DEFAULT_DATABASE),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            max_failures: DEFAULT_MAX_FAILURES,
        }
    }
}

fn parsed<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, SettingsError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| SettingsError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

impl Settings {
    /// Reads settings from the process environment; unset keys take defaults.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Settings::default();

        let temperature = parsed("TALLY_TEMPERATURE", get("TALLY_TEMPERATURE"), defaults.temperature)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(SettingsError::Invalid {
                key: "TALLY_TEMPERATURE",
                value: temperature.to_string(),
                reason: "must be between 0 and 2".to_string(),
            });
        }
        let timeout_secs = parsed(
            "TALLY_CALL_TIMEOUT_SECS",
            get("TALLY_CALL_TIMEOUT_SECS"),
            DEFAULT_CALL_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(SettingsError::Invalid {
                key: "TALLY_CALL_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            model: get("TALLY_MODEL").unwrap_or(defaults.model),
            temperature,
            database: get("TALLY_DATABASE").map(PathBuf::from).unwrap_or(defaults.database),
            call_timeout: Duration::from_secs(timeout_secs),
            max_failures: parsed("TALLY_MAX_FAILURES", get("TALLY_MAX_FAILURES"), defaults.max_failures)?,
        })
    }

    /// The API key, or `Missing` when the real LLM cannot be used.
    pub fn require_api_key(&self) -> Result<&str, SettingsError> {
        self.openai_api_key
            .as_deref()
            .ok_or(SettingsError::Missing("OPENAI_API_KEY"))
    }
}

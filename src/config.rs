//! Environment-driven configuration.
//!
//! # Environment Variables
//!
//! - `TASK_STORE_REFRESH_INTERVAL_MS`: periodic refresh interval; `0` or unset
//!   disables periodic refresh
//! - `TASK_STORE_WARM_ON_START`: `true` (default) or `false`; whether the host
//!   should call `warm_cache_both` right after building the store
//!
//! Missing variables use defaults. Malformed values are errors, never
//! silently replaced.

use std::time::Duration;

use thiserror::Error;

// =============================================================================
// Store Config
// =============================================================================

/// Host-level settings for a [`TaskStore`](crate::TaskStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Interval for periodic refresh of both partitions. `None` disables it.
    pub refresh_interval: Option<Duration>,
    /// Whether to warm both partitions as soon as the store is built.
    pub warm_on_start: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            refresh_interval: None,
            warm_on_start: true,
        }
    }
}

impl StoreConfig {
    /// Reads the configuration from `TASK_STORE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name))
    }

    /// Reads the configuration through an arbitrary variable lookup.
    ///
    /// This is what [`Self::from_env`] delegates to; tests pass a map-backed
    /// lookup instead of mutating the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let interval_ms = parse_u64(&lookup, "TASK_STORE_REFRESH_INTERVAL_MS", 0)?;
        let warm_on_start = parse_bool(&lookup, "TASK_STORE_WARM_ON_START", true)?;
        Ok(Self {
            refresh_interval: (interval_ms > 0).then(|| Duration::from_millis(interval_ms)),
            warm_on_start,
        })
    }
}

// =============================================================================
// Environment Variable Parsing
// =============================================================================

/// Error type for environment variable parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvParseError {
    /// Invalid f64 value.
    #[error("Invalid f64 value for {name}: {message} (got '{value}')")]
    InvalidF64 {
        /// Variable name.
        name: String,
        /// Error message.
        message: String,
        /// Actual value.
        value: String,
    },

    /// Invalid u64 value.
    #[error("Invalid u64 value for {name}: {message} (got '{value}')")]
    InvalidU64 {
        /// Variable name.
        name: String,
        /// Error message.
        message: String,
        /// Actual value.
        value: String,
    },

    /// Invalid boolean value.
    #[error("Invalid bool value for {name} (got '{value}')")]
    InvalidBool {
        /// Variable name.
        name: String,
        /// Actual value.
        value: String,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Environment parsing error.
    #[error("Environment parsing error: {0}")]
    EnvParseError(#[from] EnvParseError),

    /// Failure rate out of range.
    #[error("Invalid failure rate: must be 0.0-1.0, got {0}")]
    InvalidFailureRate(f64),

    /// Timeout rate out of range.
    #[error("Invalid timeout rate: must be 0.0-1.0, got {0}")]
    InvalidTimeoutRate(f64),

    /// Invalid delay range.
    #[error("Invalid delay range: min ({min}) > max ({max})")]
    InvalidDelayRange {
        /// Minimum delay.
        min: u64,
        /// Maximum delay.
        max: u64,
    },
}

fn read<F>(lookup: &F, name: &str) -> Result<Option<String>, (String, String)>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    match lookup(name) {
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(error) => Err((error.to_string(), String::new())),
    }
}

pub(crate) fn parse_u64<F>(lookup: &F, name: &str, default: u64) -> Result<u64, EnvParseError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let invalid = |message: String, value: String| EnvParseError::InvalidU64 {
        name: name.to_string(),
        message,
        value,
    };
    match read(lookup, name).map_err(|(message, value)| invalid(message, value))? {
        Some(value) if value.is_empty() => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|error: std::num::ParseIntError| invalid(error.to_string(), value)),
        None => Ok(default),
    }
}

pub(crate) fn parse_f64<F>(lookup: &F, name: &str, default: f64) -> Result<f64, EnvParseError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let invalid = |message: String, value: String| EnvParseError::InvalidF64 {
        name: name.to_string(),
        message,
        value,
    };
    match read(lookup, name).map_err(|(message, value)| invalid(message, value))? {
        Some(value) if value.is_empty() => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|error: std::num::ParseFloatError| invalid(error.to_string(), value)),
        None => Ok(default),
    }
}

pub(crate) fn parse_bool<F>(lookup: &F, name: &str, default: bool) -> Result<bool, EnvParseError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let invalid = |value: String| EnvParseError::InvalidBool {
        name: name.to_string(),
        value,
    };
    match read(lookup, name).map_err(|(_, value)| invalid(value))? {
        None => Ok(default),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(value)),
        },
    }
}

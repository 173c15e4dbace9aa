//! Fail injection for the in-memory task service.
//!
//! - **Failure rate**: probability of failing a call after it was applied
//! - **Delay injection**: artificial latency before the call completes
//! - **Timeout simulation**: probability of reporting a timeout
//!
//! Injection happens after the in-memory operation ran, so a failed call may
//! still have changed the backend, like a response lost after the write
//! landed.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ConfigError, parse_f64, parse_u64};
use crate::error::PersistenceError;

// =============================================================================
// Fail Injection Config
// =============================================================================

/// Configuration for fail injection.
#[derive(Debug, Clone, PartialEq)]
pub struct FailInjectionConfig {
    /// Probability of injecting a failure (0.0 - 1.0).
    pub failure_rate: f64,
    /// Minimum delay in milliseconds.
    pub delay_min_ms: u64,
    /// Maximum delay in milliseconds.
    pub delay_max_ms: u64,
    /// Probability of simulating a timeout (0.0 - 1.0).
    pub timeout_rate: f64,
    /// Timeout value in milliseconds (reported in the timeout error).
    pub timeout_ms: u64,
    /// RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for FailInjectionConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.0,
            delay_min_ms: 0,
            delay_max_ms: 0,
            timeout_rate: 0.0,
            timeout_ms: 5000,
            seed: None,
        }
    }
}

impl FailInjectionConfig {
    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `{prefix}_FAILURE_RATE`: Failure rate (0.0 - 1.0)
    /// - `{prefix}_DELAY_MIN_MS`: Minimum delay in milliseconds
    /// - `{prefix}_DELAY_MAX_MS`: Maximum delay in milliseconds
    /// - `{prefix}_TIMEOUT_RATE`: Timeout rate (0.0 - 1.0)
    /// - `{prefix}_TIMEOUT_MS`: Timeout value
    /// - `{prefix}_SEED`: RNG seed for reproducible runs
    ///
    /// # Errors
    ///
    /// Returns an error if any variable contains an invalid value, or if the
    /// configuration fails validation. Missing variables use default values.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(prefix, |name| std::env::var(name))
    }

    /// Same as [`Self::from_env`] with an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable contains an invalid value, or if the
    /// configuration fails validation.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let seed_name = format!("{prefix}_SEED");
        let seed = match lookup(&seed_name) {
            Ok(value) if !value.trim().is_empty() => Some(parse_u64(&lookup, &seed_name, 0)?),
            _ => None,
        };
        let config = Self {
            failure_rate: parse_f64(&lookup, &format!("{prefix}_FAILURE_RATE"), 0.0)?,
            delay_min_ms: parse_u64(&lookup, &format!("{prefix}_DELAY_MIN_MS"), 0)?,
            delay_max_ms: parse_u64(&lookup, &format!("{prefix}_DELAY_MAX_MS"), 0)?,
            timeout_rate: parse_f64(&lookup, &format!("{prefix}_TIMEOUT_RATE"), 0.0)?,
            timeout_ms: parse_u64(&lookup, &format!("{prefix}_TIMEOUT_MS"), 5000)?,
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a deterministic configuration for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn deterministic(
        failure_rate: f64,
        delay_ms: u64,
        timeout_rate: f64,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            failure_rate,
            delay_min_ms: delay_ms,
            delay_max_ms: delay_ms,
            timeout_rate,
            seed: Some(seed),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `failure_rate` is not in range `0.0..=1.0`
    /// - `timeout_rate` is not in range `0.0..=1.0`
    /// - `delay_min_ms > delay_max_ms`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(ConfigError::InvalidFailureRate(self.failure_rate));
        }
        if !(0.0..=1.0).contains(&self.timeout_rate) {
            return Err(ConfigError::InvalidTimeoutRate(self.timeout_rate));
        }
        if self.delay_min_ms > self.delay_max_ms {
            return Err(ConfigError::InvalidDelayRange {
                min: self.delay_min_ms,
                max: self.delay_max_ms,
            });
        }
        Ok(())
    }

    /// Returns whether fail injection does anything.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.failure_rate > 0.0 || self.delay_max_ms > 0 || self.timeout_rate > 0.0
    }
}

// =============================================================================
// Injector
// =============================================================================

/// Outcome drawn for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Injection {
    pub(crate) delay: Duration,
    pub(crate) failure: Option<PersistenceError>,
}

/// Draws injection outcomes from a config and an owned RNG.
#[derive(Debug)]
pub(crate) struct FailInjector {
    config: FailInjectionConfig,
    rng: StdRng,
}

impl FailInjector {
    pub(crate) fn new(config: FailInjectionConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self { config, rng }
    }

    /// Draws the delay and failure for one call of `operation`.
    pub(crate) fn draw(&mut self, operation: &str) -> Injection {
        if !self.config.is_enabled() {
            return Injection {
                delay: Duration::ZERO,
                failure: None,
            };
        }

        let delay_ms = if self.config.delay_min_ms == self.config.delay_max_ms {
            self.config.delay_min_ms
        } else {
            self.rng
                .random_range(self.config.delay_min_ms..=self.config.delay_max_ms)
        };

        let failure = if self.rng.random::<f64>() < self.config.failure_rate {
            Some(PersistenceError::Injected(format!(
                "random failure in {operation}"
            )))
        } else if self.rng.random::<f64>() < self.config.timeout_rate {
            Some(PersistenceError::Timeout {
                millis: self.config.timeout_ms,
            })
        } else {
            None
        };

        Injection {
            delay: Duration::from_millis(delay_ms),
            failure,
        }
    }
}

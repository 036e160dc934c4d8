//! Configuration of the simulated network.
//!
//! Values come from optional environment variables and fall back to the
//! defaults of the fake network (one second latency, 30% error rate). A
//! `.env` file in the working directory is loaded first when present.
//!
//! # Environment Variables
//!
//! - `NOTED_LATENCY_MS`: simulated latency in milliseconds (default: 1000)
//! - `NOTED_ERROR_RATE`: failure probability within `[0.0, 1.0]` (default: 0.3)
//! - `NOTED_ERROR_MESSAGE`: message carried by simulated failures
//!   (default: `"Error contacting the network"`)

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::strategy::DEFAULT_ERROR_RATE;

/// Simulated latency of every call.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1_000);

/// Message carried by simulated failures.
pub const DEFAULT_ERROR_MESSAGE: &str = "Error contacting the network";

/// Environment variable holding the latency in milliseconds.
pub const LATENCY_ENV: &str = "NOTED_LATENCY_MS";
/// Environment variable holding the failure probability.
pub const ERROR_RATE_ENV: &str = "NOTED_ERROR_RATE";
/// Environment variable holding the failure message.
pub const ERROR_MESSAGE_ENV: &str = "NOTED_ERROR_MESSAGE";

/// Configuration error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// The name of the environment variable.
        key: String,
        /// Description of why the value is invalid.
        message: String,
    },

    /// An env file could not be read or parsed.
    #[error("Failed to load env file {path}: {message}")]
    EnvFile {
        /// The path of the env file.
        path: String,
        /// Description of the failure.
        message: String,
    },
}

/// Settings of the simulated network.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    /// How long each call waits before resolving.
    pub latency: Duration,
    /// Probability that a call fails.
    pub error_rate: f64,
    /// Message carried by simulated failures.
    pub error_message: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            latency: DEFAULT_LATENCY,
            error_rate: DEFAULT_ERROR_RATE,
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

impl NetworkConfig {
    /// Loads configuration from environment variables.
    ///
    /// Variables from a `.env` file are added to the environment first;
    /// variables already set take precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable cannot be parsed or
    /// the error rate lies outside `[0.0, 1.0]`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an env file, falling back to the process
    /// environment for keys the file does not set.
    ///
    /// The process environment is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvFile` if the file cannot be read or parsed,
    /// and the errors of [`NetworkConfig::from_env`] otherwise.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let env_file_error = |error: dotenvy::Error| ConfigError::EnvFile {
            path: path.display().to_string(),
            message: error.to_string(),
        };
        let values = dotenvy::from_path_iter(path)
            .map_err(env_file_error)?
            .collect::<Result<HashMap<String, String>, _>>()
            .map_err(env_file_error)?;

        Self::from_lookup(|key| values.get(key).cloned().or_else(|| env::var(key).ok()))
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`NetworkConfig::from_env`].
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let latency = get_optional_parsed(&lookup, LATENCY_ENV)?
            .map_or(DEFAULT_LATENCY, Duration::from_millis);
        let error_rate = get_optional_parsed(&lookup, ERROR_RATE_ENV)?.unwrap_or(DEFAULT_ERROR_RATE);
        if !(0.0..=1.0).contains(&error_rate) {
            return Err(ConfigError::InvalidValue {
                key: ERROR_RATE_ENV.to_string(),
                message: format!("{error_rate} is not within [0.0, 1.0]"),
            });
        }
        let error_message =
            lookup(ERROR_MESSAGE_ENV).unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());

        Ok(Self {
            latency,
            error_rate,
            error_message,
        })
    }

    /// Returns a copy with a different latency.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns a copy with a different failure message.
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }
}

fn get_optional_parsed<L, T>(lookup: &L, key: &str) -> Result<Option<T>, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|value| {
            value.trim().parse().map_err(|error: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: error.to_string(),
            })
        })
        .transpose()
}

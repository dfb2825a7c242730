//! Runtime configuration for the server and the dispatcher.
//!
//! Every field has a default, so a partial JSON document or a partial set of
//! environment variables is enough:
//!
//! | Field                 | Env var                        | Default   |
//! |-----------------------|--------------------------------|-----------|
//! | `max_request_size`    | `WAYMARK_MAX_REQUEST_SIZE`     | 8 MiB     |
//! | `initial_buffer_size` | `WAYMARK_INITIAL_BUFFER_SIZE`  | 4096      |
//! | `max_forwards`        | `WAYMARK_MAX_FORWARDS`         | 8         |
//!
//! ```rust
//! use waymark::config::Config;
//!
//! let config = Config::from_json(r#"{ "max_forwards": 2 }"#).unwrap();
//! assert_eq!(config.max_forwards, 2);
//! assert_eq!(config.initial_buffer_size, 4096);
//! ```

use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum size of a complete HTTP request we will buffer before rejecting it (8 MiB).
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 8 * 1024 * 1024;

/// Initial read buffer capacity per connection.
pub const DEFAULT_INITIAL_BUFFER_SIZE: usize = 4096;

/// How many [`Effect::Forward`](crate::router::Effect::Forward) hops one request may take.
pub const DEFAULT_MAX_FORWARDS: usize = 8;

const ENV_MAX_REQUEST_SIZE: &str = "WAYMARK_MAX_REQUEST_SIZE";
const ENV_INITIAL_BUFFER_SIZE: &str = "WAYMARK_INITIAL_BUFFER_SIZE";
const ENV_MAX_FORWARDS: &str = "WAYMARK_MAX_FORWARDS";

/// Errors produced while loading or validating a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("environment variable {name} has invalid value `{value}`")]
    Env { name: &'static str, value: String },

    #[error("invalid configuration: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_request_size: usize,
    pub initial_buffer_size: usize,
    pub max_forwards: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            initial_buffer_size: DEFAULT_INITIAL_BUFFER_SIZE,
            max_forwards: DEFAULT_MAX_FORWARDS,
        }
    }
}

impl Config {
    /// Parse and validate a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build from `WAYMARK_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    // Separated from `from_env` so tests don't have to mutate the process environment.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &'static str, default: usize| -> Result<usize, ConfigError> {
            match lookup(name) {
                None => Ok(default),
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Env { name, value }),
            }
        };

        let config = Self {
            max_request_size: read(ENV_MAX_REQUEST_SIZE, DEFAULT_MAX_REQUEST_SIZE)?,
            initial_buffer_size: read(ENV_INITIAL_BUFFER_SIZE, DEFAULT_INITIAL_BUFFER_SIZE)?,
            max_forwards: read(ENV_MAX_FORWARDS, DEFAULT_MAX_FORWARDS)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_request_size == 0 {
            return Err(ConfigError::Invalid {
                field: "max_request_size",
                reason: "must be greater than zero",
            });
        }
        if self.initial_buffer_size == 0 {
            return Err(ConfigError::Invalid {
                field: "initial_buffer_size",
                reason: "must be greater than zero",
            });
        }
        if self.initial_buffer_size > self.max_request_size {
            return Err(ConfigError::Invalid {
                field: "initial_buffer_size",
                reason: "must not exceed max_request_size",
            });
        }
        Ok(())
    }
}

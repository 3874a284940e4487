// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the database and avatar blobs | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `MAX_AVATAR_BYTES` | Largest accepted avatar upload | `2097152` |
//! | `PASSWORD_ITERATIONS` | PBKDF2 iterations for new password hashes | `100000` |
//! | `JANITOR_INTERVAL_SECS` | Seconds between maintenance sweeps | `300` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::credentials::DEFAULT_ITERATIONS;
use crate::profile::DEFAULT_MAX_AVATAR_BYTES;
use crate::storage::paths::DATA_ROOT;

/// Environment variable name for the data directory path.
///
/// Holds `arcade.redb` and the `avatars/` blob directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const MAX_AVATAR_BYTES_ENV: &str = "MAX_AVATAR_BYTES";
pub const PASSWORD_ITERATIONS_ENV: &str = "PASSWORD_ITERATIONS";
pub const JANITOR_INTERVAL_ENV: &str = "JANITOR_INTERVAL_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_JANITOR_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("expected 'json' or 'pretty', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub max_avatar_bytes: usize,
    pub password_iterations: NonZeroU32,
    pub janitor_interval: Duration,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DATA_ROOT),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_avatar_bytes: DEFAULT_MAX_AVATAR_BYTES,
            password_iterations: NonZeroU32::new(DEFAULT_ITERATIONS).unwrap_or(NonZeroU32::MIN),
            janitor_interval: Duration::from_secs(DEFAULT_JANITOR_INTERVAL_SECS),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` to resolve variables. Unset variables take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let janitor_secs: u64 = parse(&lookup, JANITOR_INTERVAL_ENV)?
            .unwrap_or(DEFAULT_JANITOR_INTERVAL_SECS);
        if janitor_secs == 0 {
            return Err(ConfigError::Invalid {
                var: JANITOR_INTERVAL_ENV,
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let max_avatar_bytes: usize =
            parse(&lookup, MAX_AVATAR_BYTES_ENV)?.unwrap_or(defaults.max_avatar_bytes);
        if max_avatar_bytes == 0 {
            return Err(ConfigError::Invalid {
                var: MAX_AVATAR_BYTES_ENV,
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            data_dir: lookup(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            host: lookup(HOST_ENV).unwrap_or(defaults.host),
            port: parse(&lookup, PORT_ENV)?.unwrap_or(defaults.port),
            max_avatar_bytes,
            password_iterations: parse(&lookup, PASSWORD_ITERATIONS_ENV)?
                .unwrap_or(defaults.password_iterations),
            janitor_interval: Duration::from_secs(janitor_secs),
            log_format: parse(&lookup, LOG_FORMAT_ENV)?.unwrap_or(defaults.log_format),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        })
}

//! Runtime configuration for the grid server.
//!
//! Read once at startup from the environment:
//!
//! - `PORT` - HTTP port (default: 8080)
//! - `GRID_CACHE_DIR` - root of the filesystem byte store (default: `cache`)
//! - `GRID_DISPATCH_TIMEOUT_MS` - per-dispatch deadline in milliseconds
//!   (default: 30000, `0` disables it)

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CACHE_DIR: &str = "cache";
pub const DEFAULT_DISPATCH_TIMEOUT_MS: u64 = 30_000;

/// A configuration variable held a value that could not be parsed.
#[derive(Debug, Error)]
#[error("Invalid value for {var}: {value:?} ({reason})")]
pub struct ConfigError {
    pub var: String,
    pub value: String,
    pub reason: String,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub port: u16,
    pub cache_dir: PathBuf,
    pub dispatch_timeout_ms: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            dispatch_timeout_ms: DEFAULT_DISPATCH_TIMEOUT_MS,
        }
    }
}

impl GridConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable source. Unset variables keep their
    /// defaults; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(port) = get("PORT") {
            config.port = parse("PORT", &port)?;
        }
        if let Some(dir) = get("GRID_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(ms) = get("GRID_DISPATCH_TIMEOUT_MS") {
            config.dispatch_timeout_ms = parse("GRID_DISPATCH_TIMEOUT_MS", &ms)?;
        }
        Ok(config)
    }

    /// `0.0.0.0:<port>`.
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// The dispatch deadline, or `None` when disabled.
    pub fn dispatch_timeout(&self) -> Option<Duration> {
        match self.dispatch_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

fn parse<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError {
        var: var.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

//! Process configuration read from environment variables.

use crate::dataset::DATASET_URL;
use crate::error::{DashboardError, Result};
use std::time::Duration;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8050;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    pub dataset_url: String,
    pub debug: bool,
    pub dataset_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            dataset_url: DATASET_URL.to_string(),
            debug: false,
            dataset_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl DashboardConfig {
    /// Reads `HOST`, `PORT`, `DATASET_URL`, `DASHBOARD_DEBUG` and
    /// `DATASET_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| DashboardError::Config(format!("PORT must be a number, got '{raw}'")))?,
            None => defaults.port,
        };

        let dataset_timeout = match lookup("DATASET_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| {
                    DashboardError::Config(format!(
                        "DATASET_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                    ))
                })?,
            None => defaults.dataset_timeout,
        };

        let debug = match lookup("DASHBOARD_DEBUG") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                DashboardError::Config(format!("DASHBOARD_DEBUG must be a boolean, got '{raw}'"))
            })?,
            None => defaults.debug,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            dataset_url: lookup("DATASET_URL").unwrap_or(defaults.dataset_url),
            debug,
            dataset_timeout,
        })
    }

    /// Default `env_logger` filter for this configuration.
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

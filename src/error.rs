//! Error taxonomy for the dashboard.
//!
//! Only `DataUnavailable` and `Config` are fatal, and only at startup. The
//! other variants are reported per interaction and degrade to empty or partial
//! charts.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// Network, HTTP, CSV or schema failure while loading the dataset.
    #[error("Dataset unavailable: {0}")]
    DataUnavailable(String),
    #[error("Cannot aggregate an empty table")]
    EmptyGroup,
    #[error("Per-capita ratio undefined for '{country}': population is zero")]
    UndefinedRatio { country: String },
    #[error("Unknown interest variable '{0}'")]
    UnknownInterestVariable(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<csv::Error> for DashboardError {
    fn from(err: csv::Error) -> Self {
        DashboardError::DataUnavailable(format!("malformed CSV: {err}"))
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        DashboardError::DataUnavailable(err.to_string())
    }
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;

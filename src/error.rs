//! Errors that abort a computation.
//!
//! Only the fatal kinds live here. An infeasible exact objective is reported as
//! `objective_value: None` on its outcome, and an over-budget individual is
//! scored as `Fitness::ZERO`; neither is an `Err`.

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid or inconsistent run parameters
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A malformed zone or site record
    #[error("data error: {0}")]
    Data(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }
}

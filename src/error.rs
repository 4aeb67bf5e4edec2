use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("{0} not found upstream")]
    NotFound(String),

    #[error("Upstream request failed with status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed upstream payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PulseError {
    /// The named job or build does not exist upstream.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// A single upstream call failed (transport, timeout, non-success status or bad payload).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::ApiError { .. } | Self::Timeout(_) | Self::Network(_) | Self::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PulseError>;

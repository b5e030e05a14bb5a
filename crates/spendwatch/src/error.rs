//! Error types for spendwatch

use thiserror::Error;

/// Result type alias using spendwatch's Error type
pub type Result<T> = std::result::Result<T, Error>;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    /// Billing service call failed or answered with an unexpected shape
    #[error("Billing query failed: {0}")]
    UpstreamQuery(#[source] BoxError),

    /// Webhook answered with a non-200 status
    #[error("Request to Slack returned error {status}, the response is:\n{body}")]
    Delivery { status: u16, body: String },

    /// Network failure reaching the webhook
    #[error("Webhook transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn upstream(err: impl Into<BoxError>) -> Self {
        Self::UpstreamQuery(err.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

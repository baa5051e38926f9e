//! Error types for the session core.

use thiserror::Error;

use crate::config::messages;
use crate::proxy::ProxyError;
use crate::storage::StoreError;

/// Every failure a chat command can report. All of them are recoverable:
/// the user can retry or reset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Input rejected locally before anything else happened.
    #[error("{0}")]
    Validation(&'static str),

    /// The client-side quota for the current window is used up.
    #[error("{}", messages::RATE_LIMIT_EXCEEDED)]
    RateLimited { remaining: u32 },

    /// The proxy answered with a non-success status.
    #[error("{message}")]
    Proxy { status: u16, message: String },

    /// The proxy could not be reached or its answer could not be read.
    #[error("{}", messages::NETWORK_ERROR)]
    Transport { detail: String },

    /// A reply or reconstruction is still in flight.
    #[error("{}", messages::BUSY)]
    Busy,

    /// The conversation handle could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<ProxyError> for ChatError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::Status { status, message } => Self::Proxy {
                status,
                message: message.unwrap_or_else(|| messages::API_CALL_FAILED.to_string()),
            },
            ProxyError::Transport(detail) => Self::Transport { detail },
        }
    }
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

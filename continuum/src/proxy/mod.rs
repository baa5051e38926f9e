//! The proxy contract the session core depends on.
//!
//! [`ResponsesProxy`] is the seam between the core and the network: the
//! controller and reconstructor only ever talk to this trait. [`HttpProxy`]
//! implements it against the `server` module's routes.

mod client;

pub use client::HttpProxy;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ConversationHandle, CreateTurnRequest, CreateTurnResponse, ResponseItem};

/// Failure of a proxy operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// Non-success status, with the `error` message from the body when present.
    #[error("proxy returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    /// Connection or decoding failure.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Operations exposed by the request-forwarding proxy.
#[async_trait]
pub trait ResponsesProxy: Send + Sync {
    /// Send a new user turn, continuing `previous_response_id` when set.
    async fn create_turn(
        &self,
        request: &CreateTurnRequest,
    ) -> Result<CreateTurnResponse, ProxyError>;

    /// The model's own output items for the exchange named by `handle`.
    async fn fetch_previous_response(
        &self,
        handle: &ConversationHandle,
    ) -> Result<Vec<ResponseItem>, ProxyError>;

    /// The input items (prior turns) that led to the exchange named by `handle`.
    async fn list_input_items(
        &self,
        handle: &ConversationHandle,
    ) -> Result<Vec<ResponseItem>, ProxyError>;
}

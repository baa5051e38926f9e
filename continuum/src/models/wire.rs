//! JSON shapes exchanged with the proxy server.
//!
//! Field names follow the proxy's wire format, which in turn mirrors the
//! upstream Responses API (`output`, `data`, `previous_response_id`).

use serde::{Deserialize, Serialize};

use super::ConversationHandle;

/// Item type that carries displayable content.
pub const MESSAGE_ITEM_TYPE: &str = "message";

fn default_item_type() -> String {
    MESSAGE_ITEM_TYPE.to_string()
}

/// One content block of a response or input item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Block type (`input_text`, `output_text`, `refusal`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Text of the block, absent for non-text blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    /// A plain text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: None,
            text: Some(text.into()),
        }
    }
}

/// An item of conversation history, either a prior input or a model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseItem {
    /// Item type; only `message` items are displayable. Defaults to `message`.
    #[serde(rename = "type", default = "default_item_type")]
    pub kind: String,
    /// Author role as sent by the service.
    #[serde(default)]
    pub role: Option<String>,
    /// Content blocks in order.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl ResponseItem {
    /// A `message` item with one text block per entry of `texts`.
    pub fn message(role: &str, texts: &[&str]) -> Self {
        Self {
            kind: default_item_type(),
            role: Some(role.to_string()),
            content: texts.iter().map(|t| ContentBlock::text(*t)).collect(),
        }
    }

    pub fn is_message(&self) -> bool {
        self.kind == MESSAGE_ITEM_TYPE
    }

    /// Text of the final content block, if it has any.
    pub fn last_text(&self) -> Option<&str> {
        self.content.last().and_then(|block| block.text.as_deref())
    }
}

/// Body of a create-turn request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTurnRequest {
    /// The user's text, sent as typed.
    pub input: String,
    /// Handle of the exchange to continue; `null` starts a new conversation.
    pub previous_response_id: Option<ConversationHandle>,
}

/// Body of a successful create-turn response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTurnResponse {
    /// The assistant's reply text.
    #[serde(default)]
    pub response: String,
    /// Handle of the exchange just created.
    #[serde(rename = "responseId", default)]
    pub response_id: Option<String>,
}

impl CreateTurnResponse {
    /// The new conversation handle, if the proxy returned a usable one.
    pub fn new_handle(&self) -> Option<ConversationHandle> {
        self.response_id.clone().and_then(ConversationHandle::new)
    }
}

/// Body of a fetch-previous-response success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviousResponseBody {
    #[serde(default)]
    pub output: Vec<ResponseItem>,
}

/// Body of a list-input-items success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputItemsBody {
    #[serde(default)]
    pub data: Vec<ResponseItem>,
}

/// Body of any proxy failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

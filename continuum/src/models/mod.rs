//! Data models for conversations and the proxy wire format.

mod handle;
mod message;
mod wire;

pub use handle::ConversationHandle;
pub use message::{Role, Transcript, TranscriptItem};
pub use wire::{
    ContentBlock, CreateTurnRequest, CreateTurnResponse, ErrorBody, InputItemsBody,
    PreviousResponseBody, ResponseItem, MESSAGE_ITEM_TYPE,
};

//! Rebuilding a transcript from a conversation handle.
//!
//! The proxy exposes two read-only lookups for a handle: the input items that
//! led to it (prior turns) and the outputs it produced. Merging them gives the
//! displayed history plus the reply that is still "live".
//!
//! Only the final output item is treated as the live answer. When a handle
//! produced several outputs (tool calls, multi-part replies), everything
//! before the last one is history and joins the transcript; the last one
//! becomes the pending reply and is never also appended.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::ChatError;
use crate::models::{ConversationHandle, ResponseItem, Role, Transcript};
use crate::proxy::ResponsesProxy;

/// Result of merging the two lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconstruction {
    pub transcript: Transcript,
    pub pending_reply: Option<String>,
}

/// Merge prior input items and the handle's outputs.
pub fn merge_history(prior_turns: &[ResponseItem], outputs: &[ResponseItem]) -> Reconstruction {
    let mut transcript = Transcript::new();
    for item in prior_turns {
        append_item(&mut transcript, item);
    }

    let pending_reply = match outputs.split_last() {
        Some((live, history)) => {
            for item in history {
                append_item(&mut transcript, item);
            }
            live.last_text().map(str::to_string)
        }
        None => None,
    };

    Reconstruction {
        transcript,
        pending_reply,
    }
}

/// Append one transcript line per text block of a displayable message item.
fn append_item(transcript: &mut Transcript, item: &ResponseItem) {
    if !item.is_message() {
        debug!(kind = %item.kind, "skipping non-message item");
        return;
    }
    let Some(role) = item.role.as_deref().and_then(Role::from_str) else {
        debug!(role = ?item.role, "skipping item with undisplayable role");
        return;
    };

    for block in &item.content {
        if let Some(text) = &block.text {
            transcript.push(role, text.clone());
        }
    }
}

/// Runs both lookups for a handle and merges them.
pub struct ConversationReconstructor {
    proxy: Arc<dyn ResponsesProxy>,
}

impl ConversationReconstructor {
    pub fn new(proxy: Arc<dyn ResponsesProxy>) -> Self {
        Self { proxy }
    }

    /// Fetch and merge the history behind `handle`.
    ///
    /// The lookups run concurrently; the merge only happens once both have
    /// succeeded. Either failing fails the whole reconstruction.
    pub async fn reconstruct(
        &self,
        handle: &ConversationHandle,
    ) -> Result<Reconstruction, ChatError> {
        let (prior_turns, outputs) = tokio::join!(
            self.proxy.list_input_items(handle),
            self.proxy.fetch_previous_response(handle),
        );
        let prior_turns = prior_turns?;
        let outputs = outputs?;

        let merged = merge_history(&prior_turns, &outputs);
        info!(
            %handle,
            items = merged.transcript.len(),
            pending = merged.pending_reply.is_some(),
            "reconstructed conversation"
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentBlock, TranscriptItem};
    use crate::proxy::ProxyError;
    use crate::session::test_support::FakeProxy;

    fn texts(transcript: &Transcript) -> Vec<(Role, &str)> {
        transcript
            .items()
            .iter()
            .map(|TranscriptItem { role, text, .. }| (*role, text.as_str()))
            .collect()
    }

    #[test]
    fn single_output_becomes_pending_only() {
        let outputs = [ResponseItem::message("assistant", &["Only answer"])];
        let merged = merge_history(&[], &outputs);
        assert!(merged.transcript.is_empty());
        assert_eq!(merged.pending_reply.as_deref(), Some("Only answer"));
    }

    #[test]
    fn two_outputs_append_first_and_promote_second() {
        let outputs = [
            ResponseItem::message("assistant", &["Let me check."]),
            ResponseItem::message("assistant", &["Here it is."]),
        ];
        let merged = merge_history(&[], &outputs);
        assert_eq!(
            texts(&merged.transcript),
            vec![(Role::Assistant, "Let me check.")]
        );
        assert_eq!(merged.pending_reply.as_deref(), Some("Here it is."));
    }

    #[test]
    fn no_outputs_leaves_prior_turns_only() {
        let prior = [
            ResponseItem::message("user", &["Hi"]),
            ResponseItem::message("assistant", &["Hello!"]),
        ];
        let merged = merge_history(&prior, &[]);
        assert_eq!(
            texts(&merged.transcript),
            vec![(Role::User, "Hi"), (Role::Assistant, "Hello!")]
        );
        assert_eq!(merged.pending_reply, None);
    }

    #[test]
    fn one_item_per_content_block_in_order() {
        let prior = [ResponseItem::message("user", &["first", "second"])];
        let merged = merge_history(&prior, &[]);
        assert_eq!(
            texts(&merged.transcript),
            vec![(Role::User, "first"), (Role::User, "second")]
        );
        let sequences: Vec<_> = merged.transcript.items().iter().map(|i| i.sequence).collect();
        assert_eq!(sequences, vec![0, 1]);
    }

    #[test]
    fn pending_is_last_block_of_last_output() {
        let outputs = [ResponseItem::message("assistant", &["draft", "final"])];
        let merged = merge_history(&[], &outputs);
        assert_eq!(merged.pending_reply.as_deref(), Some("final"));
        assert!(merged.transcript.is_empty());
    }

    #[test]
    fn non_message_items_and_hidden_roles_are_skipped() {
        let prior = [
            ResponseItem::message("developer", &["system prompt"]),
            ResponseItem {
                kind: "function_call_output".to_string(),
                role: None,
                content: vec![ContentBlock::text("{}")],
            },
            ResponseItem::message("user", &["visible"]),
            ResponseItem {
                kind: "message".to_string(),
                role: Some("assistant".to_string()),
                content: vec![ContentBlock {
                    kind: Some("refusal".to_string()),
                    text: None,
                }],
            },
        ];
        let merged = merge_history(&prior, &[]);
        assert_eq!(texts(&merged.transcript), vec![(Role::User, "visible")]);
    }

    #[test]
    fn live_output_without_text_has_no_pending() {
        let outputs = [
            ResponseItem::message("assistant", &["Calling a tool"]),
            ResponseItem {
                kind: "function_call".to_string(),
                role: None,
                content: Vec::new(),
            },
        ];
        let merged = merge_history(&[], &outputs);
        assert_eq!(merged.pending_reply, None);
        assert_eq!(merged.transcript.len(), 1);
    }

    #[tokio::test]
    async fn reconstruct_merges_both_lookups() {
        let proxy = FakeProxy::new()
            .with_input_items(Ok(vec![ResponseItem::message(
                "user",
                &["Previous message"],
            )]))
            .with_outputs(Ok(vec![ResponseItem::message(
                "assistant",
                &["AI response message"],
            )]));
        let reconstructor = ConversationReconstructor::new(Arc::new(proxy));

        let merged = reconstructor
            .reconstruct(&ConversationHandle::new("abc").unwrap())
            .await
            .unwrap();
        assert_eq!(texts(&merged.transcript), vec![(Role::User, "Previous message")]);
        assert_eq!(merged.pending_reply.as_deref(), Some("AI response message"));
    }

    #[tokio::test]
    async fn either_lookup_failing_fails_reconstruction() {
        let proxy = FakeProxy::new()
            .with_input_items(Ok(vec![ResponseItem::message("user", &["hi"])]))
            .with_outputs(Err(ProxyError::Status {
                status: 404,
                message: Some("Response not found".to_string()),
            }));
        let reconstructor = ConversationReconstructor::new(Arc::new(proxy));

        let err = reconstructor
            .reconstruct(&ConversationHandle::new("gone").unwrap())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ChatError::Proxy {
                status: 404,
                message: "Response not found".to_string()
            }
        );
    }
}

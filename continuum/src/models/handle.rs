//! Conversation handle model.

use serde::{Deserialize, Serialize};

/// Opaque token naming the most recently completed exchange.
///
/// The completion service calls it a "previous response id"; it is only ever
/// passed back to the service to continue or look up a conversation.
/// Deserialization goes through [`ConversationHandle::new`], so a blank
/// token in a request body is rejected rather than forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversationHandle(String);

impl ConversationHandle {
    /// Wrap a raw token. Blank tokens are not handles.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ConversationHandle {
    type Error = &'static str;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or("conversation handle must not be blank")
    }
}

impl From<ConversationHandle> for String {
    fn from(handle: ConversationHandle) -> Self {
        handle.0
    }
}

impl std::fmt::Display for ConversationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tokens_are_rejected() {
        assert!(ConversationHandle::new("").is_none());
        assert!(ConversationHandle::new("  \n").is_none());
        assert_eq!(ConversationHandle::new(" resp_1 ").unwrap().as_str(), "resp_1");
    }

    #[test]
    fn deserializing_validates_like_new() {
        let handle: ConversationHandle = serde_json::from_str(r#"" resp_1 ""#).unwrap();
        assert_eq!(handle.as_str(), "resp_1");
        assert_eq!(serde_json::to_string(&handle).unwrap(), r#""resp_1""#);

        assert!(serde_json::from_str::<ConversationHandle>(r#""""#).is_err());
        assert!(serde_json::from_str::<ConversationHandle>(r#""   ""#).is_err());
    }
}

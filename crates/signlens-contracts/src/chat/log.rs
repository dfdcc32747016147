use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Model => "Model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only conversation log for the currently selected media.
///
/// Entries are never reordered or removed; the whole log is only reset when
/// the media changes.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.push(ChatMessage::new(ChatRole::User, text))
    }

    pub fn push_model(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.push(ChatMessage::new(ChatRole::Model, text))
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn reset(&mut self) {
        self.messages.clear();
    }
}

/// Renders prior turns as `Role: text` lines for the chat prompt.
pub fn format_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|message| format!("{}: {}", message.role.label(), message.text))
        .collect::<Vec<String>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_preserves_append_order() {
        let mut log = ChatLog::new();
        log.push_user("first");
        log.push_model("second");
        log.push_user("third");
        let roles: Vec<ChatRole> = log.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Model, ChatRole::User]);
        assert_eq!(log.messages()[2].text, "third");
        assert!(log.messages()[0].timestamp <= log.messages()[2].timestamp);
    }

    #[test]
    fn transcript_uses_role_labels() {
        let mut log = ChatLog::new();
        log.push_user("What is signed at 00:10?");
        log.push_model("A wave meaning hello.");
        assert_eq!(
            format_transcript(log.messages()),
            "User: What is signed at 00:10?\nModel: A wave meaning hello."
        );
        assert_eq!(format_transcript(&[]), "");
    }

    #[test]
    fn roles_serialize_lowercase() -> anyhow::Result<()> {
        let message = ChatMessage::new(ChatRole::Model, "hi");
        let value = serde_json::to_value(&message)?;
        assert_eq!(value["role"], serde_json::json!("model"));
        Ok(())
    }
}

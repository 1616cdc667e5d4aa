//! Transcript payloads carried by vendor `update` events.

use serde::{Deserialize, Serialize};

/// Speaker of a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationRole {
    /// Lifecycle notices generated locally.
    System,
    /// The local human speaker.
    User,
    /// The remote voice agent.
    #[serde(alias = "assistant")]
    Agent,
}

/// A live transcript update emitted by the vendor transport.
///
/// `transcript` is the running text shown in the live window. When the vendor
/// attaches a finished utterance it arrives as `role` + `content`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptUpdate {
    #[serde(default, alias = "transcription", alias = "text")]
    pub transcript: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ConversationRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl TranscriptUpdate {
    /// Returns the finished utterance carried by this update, if any.
    ///
    /// Empty content and system-role entries are not utterances.
    pub fn utterance(&self) -> Option<(ConversationRole, &str)> {
        match (self.role, self.content.as_deref()) {
            (Some(role), Some(content))
                if role != ConversationRole::System && !content.is_empty() =>
            {
                Some((role, content))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_role_is_an_agent() {
        let update: TranscriptUpdate =
            serde_json::from_str(r#"{"transcript":"hi","role":"assistant","content":"hi"}"#)
                .unwrap();
        assert_eq!(update.utterance(), Some((ConversationRole::Agent, "hi")));
    }

    #[test]
    fn text_key_is_read_as_transcript() {
        let update: TranscriptUpdate = serde_json::from_str(r#"{"text":"hello"}"#).unwrap();
        assert_eq!(update.transcript, "hello");
        assert!(update.utterance().is_none());
    }

    #[test]
    fn update_without_content_has_no_utterance() {
        let update = TranscriptUpdate {
            transcript: "partial".to_string(),
            role: Some(ConversationRole::User),
            content: None,
        };
        assert!(update.utterance().is_none());
    }
}

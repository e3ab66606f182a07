use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Literal shown to the user whenever a reply cannot be produced.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't process your message. Please try again later.";

/// Acknowledgment text for a message whose reply must be polled.
pub const PROCESSING_ACK: &str = "processing";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
    System,
}

impl Sender {
    /// Unknown tags coming from the backend are treated as agent output.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "user" => Sender::User,
            "system" => Sender::System,
            _ => Sender::Agent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Agent => "agent",
            Sender::System => "system",
        }
    }
}

/// Domain model for one chat bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: String,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: iso_timestamp(Utc::now()),
        }
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2026-10-18T09:30:00.123Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_uses_millis_and_zulu_suffix() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        assert_eq!(iso_timestamp(at), "2026-10-18T09:30:00.000Z");
    }

    #[test]
    fn sender_serializes_lowercase() {
        let message = ChatMessage::new(Sender::Agent, "hi");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["sender"], "agent");
        assert!(DateTime::parse_from_rfc3339(&message.timestamp).is_ok());
    }

    #[test]
    fn unknown_sender_tags_fall_back_to_agent() {
        assert_eq!(Sender::from_tag("user"), Sender::User);
        assert_eq!(Sender::from_tag("system"), Sender::System);
        assert_eq!(Sender::from_tag("assistant"), Sender::Agent);
    }
}

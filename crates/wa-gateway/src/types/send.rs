//! Types for sending messages via the gateway daemon.

use serde::{Deserialize, Serialize};

/// Domain marker appended to a phone number to form a chat address.
pub const CHAT_SUFFIX: &str = "@c.us";

/// Build a chat address from a digits-only phone number.
///
/// Numbers that already carry a domain marker are passed through unchanged.
pub fn chat_address(phone: &str) -> String {
    if phone.contains('@') {
        phone.to_string()
    } else {
        format!("{}{}", phone, CHAT_SUFFIX)
    }
}

/// Parameters for sending a message.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendParams {
    /// Chat address to deliver to (e.g., "5511912345678@c.us").
    pub chat_id: String,

    /// The message text.
    pub message: String,

    /// Session to send from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

impl SendParams {
    /// Create send params for a text message to a phone number.
    pub fn text(phone: impl AsRef<str>, message: impl Into<String>) -> Self {
        Self {
            chat_id: chat_address(phone.as_ref()),
            message: message.into(),
            session: None,
        }
    }

    /// Set the session to send from.
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }
}

/// Result of sending a message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    /// Gateway-assigned message id, used to correlate delivery receipts.
    #[serde(default)]
    pub id: Option<String>,

    /// Chat address the message was queued for.
    #[serde(default)]
    pub chat_id: Option<String>,

    /// Timestamp the daemon accepted the message (milliseconds since epoch).
    #[serde(default)]
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_address_appends_suffix_once() {
        assert_eq!(chat_address("5511912345678"), "5511912345678@c.us");
        assert_eq!(chat_address("5511912345678@c.us"), "5511912345678@c.us");
    }

    #[test]
    fn send_params_serialize_camel_case() {
        let params = SendParams::text("5511912345678", "Olá").with_session("rebanho");
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["chatId"], "5511912345678@c.us");
        assert_eq!(json["message"], "Olá");
        assert_eq!(json["session"], "rebanho");
    }
}

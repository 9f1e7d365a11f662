//! Session lifecycle events from the gateway daemon.

use serde::{Deserialize, Serialize};

/// A session event delivered over the daemon's SSE endpoint.
///
/// The SSE event name selects the variant; the event data is the JSON
/// payload carried by the corresponding struct.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A pairing QR code was issued; the session is waiting for a scan.
    Qr(QrEvent),
    /// The session connection state changed.
    State(StateEvent),
    /// A delivery receipt for a previously sent message.
    Ack(MessageAck),
}

/// Payload of a `qr` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrEvent {
    /// Base64-encoded QR code image.
    pub base64: String,

    /// How many codes have been issued for this pairing attempt.
    #[serde(default)]
    pub attempt: u32,
}

/// Payload of a `state` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEvent {
    /// The new connection state.
    pub state: SessionState,
}

/// Connection state of the WhatsApp Web session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Session is authenticated and can send.
    Connected,
    /// Session was lost; sends will fail until re-paired.
    Disconnected,
    /// Waiting for a QR code scan.
    Qrcode,
    /// Pairing in progress.
    Pairing,
    /// The account is logged in elsewhere.
    Conflict,
    /// A state this client does not know about.
    #[serde(other)]
    Unknown,
}

impl SessionState {
    /// Whether this state allows sending messages.
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected)
    }
}

/// Payload of an `ack` event (delivery receipt).
///
/// Ack levels follow the WhatsApp Web scheme: 1 = delivered to the
/// recipient's device, 2 = read. Level 0 (server receipt) is reported by
/// the daemon but carries no lifecycle transition for us.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAck {
    /// Gateway message id the receipt refers to.
    pub id: String,

    /// Ack level.
    pub ack: i32,

    /// Chat address the receipt came from, when the daemon includes it.
    #[serde(default)]
    pub chat_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_event_parses_known_states() {
        let event: StateEvent = serde_json::from_str(r#"{"state":"CONNECTED"}"#).unwrap();
        assert!(event.state.is_connected());

        let event: StateEvent = serde_json::from_str(r#"{"state":"DISCONNECTED"}"#).unwrap();
        assert_eq!(event.state, SessionState::Disconnected);
    }

    #[test]
    fn unknown_states_do_not_fail_parsing() {
        let event: StateEvent = serde_json::from_str(r#"{"state":"BROWSER_CLOSE"}"#).unwrap();
        assert_eq!(event.state, SessionState::Unknown);
        assert!(!event.state.is_connected());
    }

    #[test]
    fn ack_parses_optional_chat_id() {
        let ack: MessageAck =
            serde_json::from_str(r#"{"id":"true_5511912345678@c.us_ABC","ack":2}"#).unwrap();
        assert_eq!(ack.ack, 2);
        assert!(ack.chat_id.is_none());
    }
}

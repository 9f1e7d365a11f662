//! Message transport trait and implementations.
//!
//! Abstracted to support different transports (the WhatsApp gateway,
//! tests, dry runs). The notifier only ever talks to this trait.

use async_trait::async_trait;
use thiserror::Error;
use wa_gateway::{GatewayClient, GatewayError};

/// Errors a transport can produce for a single send attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Gateway daemon error.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The transport rejected the message.
    #[error("send rejected: {0}")]
    Rejected(String),
}

/// Receipt for an accepted message.
#[derive(Debug, Clone, Default)]
pub struct SendReceipt {
    /// Transport-assigned message id, when the transport reports one.
    pub id: Option<String>,
    /// Timestamp the transport accepted the message (milliseconds).
    pub timestamp: u64,
}

/// Trait for sending WhatsApp text messages.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Whether the underlying session is able to send right now.
    fn is_ready(&self) -> bool;

    /// Send a text message to a normalized phone number (digits only,
    /// country code included).
    async fn send_text(&self, phone: &str, body: &str) -> Result<SendReceipt, TransportError>;
}

#[async_trait]
impl Transport for GatewayClient {
    fn is_ready(&self) -> bool {
        self.is_connected()
    }

    async fn send_text(&self, phone: &str, body: &str) -> Result<SendReceipt, TransportError> {
        let result = GatewayClient::send_text(self, phone, body).await?;
        Ok(SendReceipt {
            id: result.id,
            timestamp: result.timestamp,
        })
    }
}

/// A transport that accepts and discards everything. Useful for tests and
/// dry runs.
#[derive(Debug, Clone, Default)]
pub struct NoOpTransport;

#[async_trait]
impl Transport for NoOpTransport {
    fn is_ready(&self) -> bool {
        true
    }

    async fn send_text(&self, _phone: &str, _body: &str) -> Result<SendReceipt, TransportError> {
        Ok(SendReceipt::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_transport_accepts_everything() {
        let transport = NoOpTransport;
        assert!(transport.is_ready());
        let receipt = transport.send_text("5511912345678", "test").await.unwrap();
        assert!(receipt.id.is_none());
    }
}

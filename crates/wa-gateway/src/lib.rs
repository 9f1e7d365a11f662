//! WhatsApp gateway daemon client library.
//!
//! This crate provides a Rust client for communicating with the WhatsApp
//! gateway daemon over HTTP. It supports:
//!
//! - Sending text messages to WhatsApp chats
//! - Receiving session lifecycle events via Server-Sent Events (SSE)
//! - Health checking and connection-state tracking
//!
//! # Example
//!
//! ```no_run
//! use wa_gateway::{GatewayClient, GatewayConfig};
//!
//! # async fn example() -> Result<(), wa_gateway::GatewayError> {
//! // Connect to the gateway daemon
//! let config = GatewayConfig::default();
//! let client = GatewayClient::connect(config).await?;
//!
//! // Send a message (digits only, country code included)
//! let result = client.send_text("5511912345678", "Olá!").await?;
//! println!("Queued with id: {:?}", result.id);
//!
//! // Watch session events
//! use futures::StreamExt;
//! let mut events = wa_gateway::subscribe(&client);
//! while let Some(event) = events.next().await {
//!     println!("Event: {:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use client::GatewayClient;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use events::{subscribe, subscribe_with_reconnect, ReconnectConfig, SessionStream};
pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

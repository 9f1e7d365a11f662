//! Server-Sent Events (SSE) client for session lifecycle events.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::Stream;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tracing::{debug, error, info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::types::{MessageAck, QrEvent, SessionEvent, StateEvent};
use crate::GatewayClient;

/// Configuration for automatic reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of retries (None = infinite).
    pub max_retries: Option<u32>,
    /// Initial delay before first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier for each retry.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }

    /// Check if we should retry after the given number of attempts.
    pub fn should_retry(&self, attempts: u32) -> bool {
        self.max_retries.map_or(true, |max| attempts < max)
    }
}

/// A stream of session lifecycle events from the gateway daemon.
pub struct SessionStream {
    event_source: EventSource,
    #[allow(dead_code)] // For future reconnection support
    config: GatewayConfig,
    #[allow(dead_code)] // For future reconnection support
    reconnect_config: ReconnectConfig,
    reconnect_attempts: u32,
}

impl SessionStream {
    /// Create a new session stream from a GatewayClient.
    pub fn new(client: &GatewayClient) -> Self {
        let config = client.config().clone();
        Self::with_config(config, ReconnectConfig::default())
    }

    /// Create a new session stream with custom reconnection config.
    pub fn with_reconnect(client: &GatewayClient, reconnect_config: ReconnectConfig) -> Self {
        let config = client.config().clone();
        Self::with_config(config, reconnect_config)
    }

    fn with_config(config: GatewayConfig, reconnect_config: ReconnectConfig) -> Self {
        let url = config.events_url();
        info!("Creating SSE connection to {}", url);

        // SSE connections are long-lived and must not share the RPC
        // client's request timeout.
        let sse_client = reqwest::Client::builder()
            .build()
            .expect("Failed to build SSE client");

        let request = sse_client.get(&url);
        let event_source = request.eventsource().unwrap();

        Self {
            event_source,
            config,
            reconnect_config,
            reconnect_attempts: 0,
        }
    }
}

impl Stream for SessionStream {
    type Item = Result<SessionEvent, GatewayError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.event_source).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    match event {
                        Event::Open => {
                            debug!("SSE connection opened");
                            self.reconnect_attempts = 0;
                            continue;
                        }
                        Event::Message(msg) => {
                            match parse_session_event(&msg.event, &msg.data) {
                                Ok(Some(event)) => return Poll::Ready(Some(Ok(event))),
                                Ok(None) => {
                                    debug!("Ignoring SSE event type: {}", msg.event);
                                    continue;
                                }
                                Err(e) => {
                                    warn!("Failed to parse SSE event data: {}", e);
                                    debug!("Raw data: {}", msg.data);
                                    continue;
                                }
                            }
                        }
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    error!("SSE error: {}", e);
                    return Poll::Ready(Some(Err(GatewayError::Sse(e.to_string()))));
                }
                Poll::Ready(None) => {
                    // Stream ended
                    info!("SSE stream ended");
                    return Poll::Ready(None);
                }
                Poll::Pending => {
                    return Poll::Pending;
                }
            }
        }
    }
}

/// Parse one SSE message into a session event.
///
/// The event name selects the payload type; unknown names yield `None`.
fn parse_session_event(
    event: &str,
    data: &str,
) -> Result<Option<SessionEvent>, serde_json::Error> {
    match event {
        "qr" => {
            let qr: QrEvent = serde_json::from_str(data)?;
            Ok(Some(SessionEvent::Qr(qr)))
        }
        "state" => {
            let state: StateEvent = serde_json::from_str(data)?;
            Ok(Some(SessionEvent::State(state)))
        }
        "ack" => {
            let ack: MessageAck = serde_json::from_str(data)?;
            Ok(Some(SessionEvent::Ack(ack)))
        }
        _ => Ok(None),
    }
}

/// Create a session event stream from a GatewayClient.
pub fn subscribe(client: &GatewayClient) -> SessionStream {
    SessionStream::new(client)
}

/// Create a session event stream with custom reconnection configuration.
pub fn subscribe_with_reconnect(
    client: &GatewayClient,
    reconnect_config: ReconnectConfig,
) -> SessionStream {
    SessionStream::with_reconnect(client, reconnect_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionState;

    #[test]
    fn parses_state_events() {
        let event = parse_session_event("state", r#"{"state":"DISCONNECTED"}"#)
            .unwrap()
            .unwrap();
        match event {
            SessionEvent::State(s) => assert_eq!(s.state, SessionState::Disconnected),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn parses_ack_events() {
        let event = parse_session_event("ack", r#"{"id":"msg-1","ack":1}"#)
            .unwrap()
            .unwrap();
        match event {
            SessionEvent::Ack(ack) => {
                assert_eq!(ack.id, "msg-1");
                assert_eq!(ack.ack, 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn ignores_unknown_event_names() {
        assert!(parse_session_event("typing", "{}").unwrap().is_none());
    }

    #[test]
    fn backoff_delays_are_capped() {
        let config = ReconnectConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(20), Duration::from_secs(30));
    }
}

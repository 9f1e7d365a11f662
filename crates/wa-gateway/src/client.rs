//! WhatsApp gateway daemon HTTP client.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::events;
use crate::types::{SendParams, SendResult, SessionEvent, SessionState};

/// Capacity of the session event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Serialize)]
struct RpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<T>,
    id: u64,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<T>,
    error: Option<RpcError>,
    #[allow(dead_code)]
    id: u64,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i32,
    message: String,
}

/// Version response from the daemon.
#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

/// Connection state response from the daemon.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StateResponse {
    /// Plain string response.
    String(String),
    /// Object with a state field.
    Object { state: String },
}

/// Client for communicating with the WhatsApp gateway daemon.
#[derive(Clone)]
pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
    request_id: Arc<AtomicU64>,
    connected: Arc<AtomicBool>,
}

impl GatewayClient {
    /// Connect to the gateway daemon.
    pub async fn connect(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(GatewayError::Http)?;

        let client = Self {
            http,
            config,
            request_id: Arc::new(AtomicU64::new(1)),
            connected: Arc::new(AtomicBool::new(false)),
        };

        // Verify connection with health check
        if client.health_check().await? {
            client.connected.store(true, Ordering::SeqCst);
            info!(
                "Connected to WhatsApp gateway at {}",
                client.config.base_url
            );
        } else {
            return Err(GatewayError::HealthCheckFailed);
        }

        Ok(client)
    }

    /// Check if the session is currently able to send.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Perform a health check against the daemon.
    pub async fn health_check(&self) -> Result<bool, GatewayError> {
        let url = self.config.check_url();
        debug!("Health check: {}", url);

        match self.http.get(&url).send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                self.connected.store(ok, Ordering::SeqCst);
                Ok(ok)
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                Err(GatewayError::Http(e))
            }
        }
    }

    /// Get the daemon version.
    pub async fn version(&self) -> Result<String, GatewayError> {
        let resp: VersionResponse = self.rpc_call::<(), _>("version", None).await?;
        Ok(resp.version)
    }

    /// Query the current WhatsApp Web connection state.
    pub async fn connection_state(&self) -> Result<SessionState, GatewayError> {
        let resp: StateResponse = self.rpc_call::<(), _>("getConnectionState", None).await?;
        let raw = match resp {
            StateResponse::String(s) => s,
            StateResponse::Object { state } => state,
        };
        let state: SessionState =
            serde_json::from_value(serde_json::Value::String(raw)).map_err(GatewayError::Json)?;
        self.connected.store(state.is_connected(), Ordering::SeqCst);
        Ok(state)
    }

    /// Send a message using the full SendParams structure.
    pub async fn send(&self, mut params: SendParams) -> Result<SendResult, GatewayError> {
        // Add session if not already set
        if params.session.is_none() {
            params.session = Some(self.config.session.clone());
        }

        self.rpc_call("sendText", Some(params)).await
    }

    /// Send a text message to a phone number (digits only, country code
    /// included). The chat address is derived from the number.
    pub async fn send_text(
        &self,
        phone: &str,
        message: &str,
    ) -> Result<SendResult, GatewayError> {
        let params = SendParams::text(phone, message);
        self.send(params).await
    }

    /// Start a background task that follows the session event stream,
    /// keeps the connected flag current, and republishes every event on
    /// the returned broadcast channel.
    ///
    /// The task runs until the SSE stream ends.
    pub fn start_session_monitor(
        &self,
    ) -> (JoinHandle<()>, broadcast::Receiver<SessionEvent>) {
        let client = self.clone();
        let (tx, rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let handle = tokio::spawn(async move {
            let mut stream = events::subscribe(&client);

            while let Some(result) = stream.next().await {
                match result {
                    Ok(event) => {
                        match &event {
                            SessionEvent::Qr(qr) => {
                                info!(attempt = qr.attempt, "Pairing required: QR code issued");
                            }
                            SessionEvent::State(state_event) => {
                                let up = state_event.state.is_connected();
                                client.connected.store(up, Ordering::SeqCst);
                                if up {
                                    info!("WhatsApp session connected");
                                } else {
                                    warn!(state = ?state_event.state, "WhatsApp session not connected");
                                }
                            }
                            SessionEvent::Ack(ack) => {
                                debug!(id = %ack.id, ack = ack.ack, "Delivery receipt");
                            }
                        }
                        // Observers may come and go; a lagging or absent
                        // receiver is not an error.
                        let _ = tx.send(event);
                    }
                    Err(e) => {
                        error!("Session event stream error: {}", e);
                    }
                }
            }

            warn!("Session event stream ended");
            client.connected.store(false, Ordering::SeqCst);
        });

        (handle, rx)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get the underlying HTTP client.
    pub fn http_client(&self) -> &Client {
        &self.http
    }

    /// Make a JSON-RPC call to the daemon.
    async fn rpc_call<P: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<R, GatewayError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let url = self.config.rpc_url();

        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        debug!("RPC call: {} (id={})", method, id);

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(GatewayError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Connection(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let rpc_response: RpcResponse<R> = response.json().await.map_err(GatewayError::Http)?;

        if let Some(error) = rpc_response.error {
            return Err(GatewayError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response.result.ok_or_else(|| GatewayError::Rpc {
            code: -1,
            message: "No result in response".to_string(),
        })
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}

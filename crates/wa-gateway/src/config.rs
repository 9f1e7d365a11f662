//! Configuration types for wa-gateway.

/// Configuration for connecting to the WhatsApp gateway daemon.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the daemon HTTP server (e.g., "http://localhost:21465").
    pub base_url: String,
    /// Session name the daemon keeps the WhatsApp Web login under.
    pub session: String,
}

impl GatewayConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session: "rebanho".to_string(),
        }
    }

    /// Create configuration with a specific session name.
    pub fn with_session(base_url: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session: session.into(),
        }
    }

    /// Get the RPC endpoint URL.
    pub fn rpc_url(&self) -> String {
        format!("{}/api/v1/rpc", self.base_url)
    }

    /// Get the session events endpoint URL.
    pub fn events_url(&self) -> String {
        let encoded = urlencoding::encode(&self.session);
        format!("{}/api/v1/events?session={}", self.base_url, encoded)
    }

    /// Get the health check endpoint URL.
    pub fn check_url(&self) -> String {
        format!("{}/api/v1/check", self.base_url)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new("http://localhost:21465")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_base() {
        let config = GatewayConfig::new("http://gateway:9000");
        assert_eq!(config.rpc_url(), "http://gateway:9000/api/v1/rpc");
        assert_eq!(config.check_url(), "http://gateway:9000/api/v1/check");
    }

    #[test]
    fn events_url_encodes_session() {
        let config = GatewayConfig::with_session("http://localhost:21465", "igreja central");
        assert_eq!(
            config.events_url(),
            "http://localhost:21465/api/v1/events?session=igreja%20central"
        );
    }
}

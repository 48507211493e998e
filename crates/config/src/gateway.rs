//! Subscription gateway configuration
//!
//! The gateway listener also serves `/health`, `/metrics` and the
//! transcript route `/logs/{deployment_id}`.

use serde::Deserialize;
use std::time::Duration;

/// Gateway configuration
///
/// # Example
///
/// ```toml
/// [gateway]
/// enabled = true
/// host = "0.0.0.0"
/// port = 9002
/// max_connections = 1000
/// connection_buffer = 256
/// ping_interval = "30s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Default: true
    pub enabled: bool,

    /// Default: "0.0.0.0"
    pub host: String,

    /// Default: 9002
    pub port: u16,

    /// Concurrent viewer connections
    /// Default: 1000
    pub max_connections: usize,

    /// Messages queued per connection before a slow viewer starts missing lines
    /// Default: 256
    pub connection_buffer: usize,

    /// WebSocket ping interval
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub ping_interval: Duration,

    /// Allow cross-origin browser connections
    /// Default: true
    pub cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 9002,
            max_connections: 1000,
            connection_buffer: 256,
            ping_interval: Duration::from_secs(30),
            cors: true,
        }
    }
}

impl GatewayConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert!(config.enabled);
        assert_eq!(config.addr(), "0.0.0.0:9002");
        assert_eq!(config.connection_buffer, 256);
    }

    #[test]
    fn test_custom_port() {
        let toml = r#"
port = 8081
host = "127.0.0.1"
ping_interval = "10s"
"#;
        let config: GatewayConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.addr(), "127.0.0.1:8081");
        assert_eq!(config.ping_interval, Duration::from_secs(10));
    }
}

//! Live fan-out configuration

use serde::Deserialize;

/// Fan-out publisher configuration
///
/// # Example
///
/// ```toml
/// [fanout]
/// enabled = true
/// queue_size = 10000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// Publish stored log lines to live viewers
    /// Default: true
    pub enabled: bool,

    /// Pending publishes held between the partition workers and the
    /// publisher task. Overflow drops the live copy; the stored row is kept.
    /// Default: 10000
    pub queue_size: usize,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_size: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: FanoutConfig = toml::from_str("").unwrap();
        assert!(config.enabled);
        assert_eq!(config.queue_size, 10_000);
    }
}

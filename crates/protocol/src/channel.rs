//! Real-time channel names
//!
//! Live log lines for a project are published on `logs:<channel_key>`,
//! where the channel key is the project's subdomain. Viewers may subscribe
//! to any well-formed name; only `logs:` channels ever receive traffic.

use std::fmt;

use crate::Result;
use crate::error::ProtocolError;

/// Prefix of every project log channel
pub const LOG_CHANNEL_PREFIX: &str = "logs:";

/// Longest channel name a viewer may subscribe to
pub const MAX_CHANNEL_NAME_LEN: usize = 256;

/// A validated channel name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelName(String);

impl ChannelName {
    /// Channel carrying a project's deployment logs
    pub fn for_project(channel_key: &str) -> Self {
        Self(format!("{LOG_CHANNEL_PREFIX}{channel_key}"))
    }

    /// Validate a name supplied by a viewer
    pub fn parse(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(ProtocolError::invalid_channel(name, "empty"));
        }
        if name.len() > MAX_CHANNEL_NAME_LEN {
            let head: String = name.chars().take(32).collect();
            return Err(ProtocolError::invalid_channel(head, "too long"));
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ProtocolError::invalid_channel(
                name,
                "contains whitespace or control characters",
            ));
        }
        Ok(Self(name.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

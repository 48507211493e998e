//! Tests for channel naming

use crate::channel::{ChannelName, MAX_CHANNEL_NAME_LEN};
use crate::error::ProtocolError;

#[test]
fn test_for_project() {
    let channel = ChannelName::for_project("acme");
    assert_eq!(channel.as_str(), "logs:acme");
    assert_eq!(channel.to_string(), "logs:acme");
}

#[test]
fn test_parse_log_channel() {
    let channel = ChannelName::parse("logs:acme").unwrap();
    assert_eq!(channel, ChannelName::for_project("acme"));
}

#[test]
fn test_parse_accepts_other_well_formed_names() {
    assert_eq!(ChannelName::parse("status:acme").unwrap().as_str(), "status:acme");
    assert_eq!(ChannelName::parse("logs:").unwrap().as_str(), "logs:");
}

#[test]
fn test_parse_rejects_empty() {
    assert!(matches!(
        ChannelName::parse(""),
        Err(ProtocolError::InvalidChannel { reason: "empty", .. })
    ));
}

#[test]
fn test_parse_rejects_whitespace() {
    assert!(ChannelName::parse("logs: acme").is_err());
    assert!(ChannelName::parse("logs:acme\n").is_err());
}

#[test]
fn test_parse_rejects_too_long() {
    let name = format!("logs:{}", "a".repeat(MAX_CHANNEL_NAME_LEN));
    let err = ChannelName::parse(&name).unwrap_err();
    assert!(err.to_string().contains("too long"));
}

#[test]
fn test_channels_are_distinct_per_project() {
    assert_ne!(ChannelName::for_project("foo"), ChannelName::for_project("bar"));
}

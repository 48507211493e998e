//! Tests for the subscription wire protocol

use super::*;

#[test]
fn test_parse_subscribe() {
    let frame = ClientFrame::parse(r#"{"event":"subscribe","data":"logs:acme"}"#).unwrap();
    assert_eq!(frame, ClientFrame::Subscribe("logs:acme".into()));
}

#[test]
fn test_parse_unknown_event() {
    let err = ClientFrame::parse(r#"{"event":"publish","data":"logs:acme"}"#).unwrap_err();
    assert!(matches!(err, TapError::Protocol(_)));
}

#[test]
fn test_parse_missing_data() {
    assert!(ClientFrame::parse(r#"{"event":"subscribe"}"#).is_err());
}

#[test]
fn test_parse_not_json() {
    assert!(ClientFrame::parse("subscribe logs:acme").is_err());
}

#[test]
fn test_server_message_json() {
    let json = ServerFrame::Message("Build started".into()).to_json();
    assert_eq!(json, r#"{"event":"message","data":"Build started"}"#);
}

#[test]
fn test_server_error_json() {
    let json = ServerFrame::Error("nope".into()).to_json();
    assert_eq!(json, r#"{"event":"error","data":"nope"}"#);
}

#[test]
fn test_join_ack() {
    let channel = ChannelName::for_project("acme");
    assert_eq!(join_ack(&channel), "Joined logs:acme\n");
}

#[test]
fn test_ack_survives_json_escaping() {
    let channel = ChannelName::for_project("acme");
    let json = ServerFrame::Message(join_ack(&channel)).to_json();
    assert_eq!(json, r#"{"event":"message","data":"Joined logs:acme\n"}"#);
}

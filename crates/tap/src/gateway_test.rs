//! Tests for the WebSocket gateway

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use shipyard_protocol::ChannelName;

use super::*;
use crate::hub::{ChannelPublisher, HubConfig};

fn gateway() -> GatewayServer {
    GatewayServer::new(
        Arc::new(ChannelHub::default()),
        GatewayServerConfig::default(),
        CancellationToken::new(),
    )
}

#[test]
fn test_config_defaults() {
    let config = GatewayServerConfig::default();
    assert_eq!(config.ping_interval, Duration::from_secs(30));

    let config = config.with_ping_interval(Duration::from_secs(5));
    assert_eq!(config.ping_interval, Duration::from_secs(5));
}

#[tokio::test]
async fn test_subscribe_frame_joins_channel() {
    let gateway = gateway();
    let hub = gateway.hub();
    let (id, mut rx) = hub.connect().unwrap();

    let reply = handle_text_frame(hub, id, r#"{"event":"subscribe","data":"logs:acme"}"#);
    assert!(reply.is_none());

    hub.publish(&ChannelName::for_project("acme"), "Build started");
    assert_eq!(rx.recv().await.unwrap().as_ref(), "Joined logs:acme\n");
    assert_eq!(rx.recv().await.unwrap().as_ref(), "Build started");
}

#[tokio::test]
async fn test_subscribe_on_full_queue_returns_error() {
    let hub = ChannelHub::new(HubConfig::default().with_connection_buffer(1));
    let (id, _rx) = hub.connect().unwrap();

    assert!(handle_text_frame(&hub, id, r#"{"event":"subscribe","data":"logs:acme"}"#).is_none());
    let reply = handle_text_frame(&hub, id, r#"{"event":"subscribe","data":"logs:other"}"#).unwrap();
    assert!(reply.contains(r#""event":"error""#));
    assert!(reply.contains("logs:other"));
    assert_eq!(hub.member_count(&ChannelName::for_project("other")), 0);
}

#[tokio::test]
async fn test_malformed_frame_returns_error() {
    let gateway = gateway();
    let hub = gateway.hub();
    let (id, _rx) = hub.connect().unwrap();

    let reply = handle_text_frame(hub, id, "not json").unwrap();
    assert!(reply.starts_with(r#"{"event":"error","data":"protocol error"#));
    assert_eq!(hub.stats().joins, 0);
}

#[tokio::test]
async fn test_invalid_channel_returns_error() {
    let gateway = gateway();
    let hub = gateway.hub();
    let (id, _rx) = hub.connect().unwrap();

    let reply = handle_text_frame(hub, id, r#"{"event":"subscribe","data":"logs: acme"}"#);
    assert!(reply.unwrap().contains(r#""event":"error""#));
    assert_eq!(hub.stats().channels, 0);
}

#[tokio::test]
async fn test_non_upgrade_request_rejected() {
    let app = gateway().router();

    let response = app
        .oneshot(Request::builder().uri(WS_PATH).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_unknown_path_not_found() {
    let app = gateway().router();

    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

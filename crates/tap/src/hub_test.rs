//! Tests for the channel hub

use super::*;

fn acme() -> ChannelName {
    ChannelName::for_project("acme")
}

/// Drain everything currently queued
fn drain(rx: &mut mpsc::Receiver<Arc<str>>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg.to_string());
    }
    out
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_connect_unique_ids() {
    let hub = ChannelHub::default();

    let (id1, _rx1) = hub.connect().unwrap();
    let (id2, _rx2) = hub.connect().unwrap();

    assert_ne!(id1, id2);
    assert_eq!(hub.connection_count(), 2);
}

#[tokio::test]
async fn test_max_connections() {
    let hub = ChannelHub::new(HubConfig::default().with_max_connections(1));

    let (_id, _rx) = hub.connect().unwrap();
    let result = hub.connect();

    assert!(matches!(result, Err(TapError::MaxConnections { max: 1 })));
}

#[tokio::test]
async fn test_join_unknown_connection() {
    let hub = ChannelHub::default();
    assert!(matches!(
        hub.join(42, &acme()),
        Err(TapError::ConnectionNotFound { id: 42 })
    ));
}

#[tokio::test]
async fn test_disconnect_unknown_connection() {
    let hub = ChannelHub::default();
    assert!(hub.disconnect(7).is_err());
}

// ============================================================================
// Join and publish
// ============================================================================

#[tokio::test]
async fn test_join_acknowledges_before_messages() {
    let hub = ChannelHub::default();
    let (id, mut rx) = hub.connect().unwrap();

    hub.join(id, &acme()).unwrap();
    hub.publish(&acme(), "Build started");
    hub.publish(&acme(), "Done");

    assert_eq!(
        drain(&mut rx),
        vec!["Joined logs:acme\n", "Build started", "Done"]
    );
}

#[tokio::test]
async fn test_publish_without_members() {
    let hub = ChannelHub::default();
    assert_eq!(hub.publish(&acme(), "nobody listens"), 0);
    assert_eq!(hub.stats().published, 1);
}

#[tokio::test]
async fn test_channel_isolation() {
    let hub = ChannelHub::default();
    let (foo_id, mut foo_rx) = hub.connect().unwrap();
    let (bar_id, mut bar_rx) = hub.connect().unwrap();
    let foo = ChannelName::for_project("foo");
    let bar = ChannelName::for_project("bar");

    hub.join(foo_id, &foo).unwrap();
    hub.join(bar_id, &bar).unwrap();
    hub.publish(&bar, "for bar only");

    assert_eq!(drain(&mut foo_rx), vec!["Joined logs:foo\n"]);
    assert_eq!(drain(&mut bar_rx), vec!["Joined logs:bar\n", "for bar only"]);
}

#[tokio::test]
async fn test_publish_reaches_all_members() {
    let hub = ChannelHub::default();
    let (id1, mut rx1) = hub.connect().unwrap();
    let (id2, mut rx2) = hub.connect().unwrap();
    hub.join(id1, &acme()).unwrap();
    hub.join(id2, &acme()).unwrap();

    assert_eq!(hub.publish(&acme(), "line"), 2);
    assert_eq!(drain(&mut rx1).last().map(String::as_str), Some("line"));
    assert_eq!(drain(&mut rx2).last().map(String::as_str), Some("line"));
}

#[tokio::test]
async fn test_join_twice_delivers_once() {
    let hub = ChannelHub::default();
    let (id, mut rx) = hub.connect().unwrap();

    hub.join(id, &acme()).unwrap();
    hub.join(id, &acme()).unwrap();
    hub.publish(&acme(), "once");

    assert_eq!(hub.member_count(&acme()), 1);
    assert_eq!(
        drain(&mut rx),
        vec!["Joined logs:acme\n", "Joined logs:acme\n", "once"]
    );
}

#[tokio::test]
async fn test_connection_joins_several_channels() {
    let hub = ChannelHub::default();
    let (id, mut rx) = hub.connect().unwrap();
    let other = ChannelName::for_project("other");

    hub.join(id, &acme()).unwrap();
    hub.join(id, &other).unwrap();
    hub.publish(&other, "b");
    hub.publish(&acme(), "a");

    let received = drain(&mut rx);
    assert_eq!(&received[2..], ["b", "a"]);
}

#[tokio::test]
async fn test_full_queue_drops_and_counts() {
    let hub = ChannelHub::new(HubConfig::default().with_connection_buffer(2));
    let (id, mut rx) = hub.connect().unwrap();
    hub.join(id, &acme()).unwrap();

    // Ack takes one slot
    assert_eq!(hub.publish(&acme(), "fits"), 1);
    assert_eq!(hub.publish(&acme(), "dropped"), 0);

    let stats = hub.stats();
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.dropped, 1);
    assert_eq!(drain(&mut rx), vec!["Joined logs:acme\n", "fits"]);
}

#[tokio::test]
async fn test_join_refused_when_ack_does_not_fit() {
    let hub = ChannelHub::new(HubConfig::default().with_connection_buffer(1));
    let (id, mut rx) = hub.connect().unwrap();
    hub.join(id, &acme()).unwrap();

    let other = ChannelName::for_project("other");
    assert!(matches!(
        hub.join(id, &other),
        Err(TapError::QueueFull { id: failed, .. }) if failed == id
    ));
    assert_eq!(hub.member_count(&other), 0);
    assert_eq!(hub.publish(&other, "never delivered"), 0);

    // Once the viewer catches up the same join succeeds and is acknowledged
    assert_eq!(drain(&mut rx), vec!["Joined logs:acme\n"]);
    hub.join(id, &other).unwrap();
    assert_eq!(hub.member_count(&other), 1);
    assert_eq!(drain(&mut rx), vec!["Joined logs:other\n"]);
    assert_eq!(hub.stats().joins, 2);
}

// ============================================================================
// Disconnect and cleanup
// ============================================================================

#[tokio::test]
async fn test_disconnect_removes_membership() {
    let hub = ChannelHub::default();
    let (id, _rx) = hub.connect().unwrap();
    hub.join(id, &acme()).unwrap();

    hub.disconnect(id).unwrap();

    assert_eq!(hub.connection_count(), 0);
    assert_eq!(hub.member_count(&acme()), 0);
    assert_eq!(hub.stats().channels, 0);
    assert_eq!(hub.publish(&acme(), "gone"), 0);
}

#[tokio::test]
async fn test_cleanup_closed_receivers() {
    let hub = ChannelHub::default();
    let (id, rx) = hub.connect().unwrap();
    let (_keep_id, _keep_rx) = hub.connect().unwrap();
    hub.join(id, &acme()).unwrap();

    drop(rx);

    assert_eq!(hub.cleanup(), 1);
    assert_eq!(hub.connection_count(), 1);
    assert_eq!(hub.member_count(&acme()), 0);
}

#[tokio::test]
async fn test_maintenance_stops_on_cancel() {
    let hub = Arc::new(ChannelHub::default());
    let cancel = CancellationToken::new();

    let handle = hub.spawn_maintenance(cancel.clone());
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("maintenance task should stop")
        .unwrap();
}

#[tokio::test]
async fn test_publisher_trait_object() {
    let hub = Arc::new(ChannelHub::default());
    let (id, mut rx) = hub.connect().unwrap();
    hub.join(id, &acme()).unwrap();

    let publisher: Arc<dyn ChannelPublisher> = hub.clone();
    publisher.publish(&acme(), "via trait");

    assert_eq!(drain(&mut rx).last().map(String::as_str), Some("via trait"));
}

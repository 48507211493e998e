//! Tests for the fan-out publisher

use async_trait::async_trait;
use shipyard_control::{ControlError, ProjectRoute, StaticDirectory};
use shipyard_protocol::ChannelName;
use shipyard_tap::ChannelHub;

use super::*;

/// Directory that never answers in time
struct SlowDirectory;

#[async_trait]
impl DeploymentDirectory for SlowDirectory {
    async fn resolve(&self, _deployment_id: &str) -> shipyard_control::Result<Option<ProjectRoute>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Err(ControlError::Unavailable("too slow".into()))
    }
}

fn subscribed_hub(channel_key: &str) -> (Arc<ChannelHub>, mpsc::Receiver<Arc<str>>) {
    let hub = Arc::new(ChannelHub::default());
    let (id, mut rx) = hub.connect().unwrap();
    hub.join(id, &ChannelName::for_project(channel_key)).unwrap();
    // Consume the join acknowledgement
    assert!(rx.try_recv().unwrap().starts_with("Joined"));
    (hub, rx)
}

#[tokio::test]
async fn test_publish_to_project_channel() {
    let (hub, mut rx) = subscribed_hub("acme");
    let directory = Arc::new(StaticDirectory::new().with_route("d1", "p1", "acme"));
    let publisher = FanoutPublisher::new(directory, hub);

    assert_eq!(publisher.publish_one("d1", "Build started").await, Some(1));
    assert_eq!(rx.try_recv().unwrap().as_ref(), "Build started");
    assert_eq!(publisher.metrics().snapshot().published, 1);
}

#[tokio::test]
async fn test_unknown_deployment_skipped() {
    let (hub, mut rx) = subscribed_hub("acme");
    let publisher = FanoutPublisher::new(Arc::new(StaticDirectory::new()), hub);

    assert_eq!(publisher.publish_one("d9", "line").await, None);
    assert!(rx.try_recv().is_err());
    assert_eq!(publisher.metrics().snapshot().unresolved, 1);
}

#[tokio::test]
async fn test_lookup_failure_skipped() {
    let (hub, mut rx) = subscribed_hub("acme");
    let directory = StaticDirectory::new().with_route("d2", "p1", "acme");
    directory.fail_lookups("d2");
    let publisher = FanoutPublisher::new(Arc::new(directory), hub);

    assert_eq!(publisher.publish_one("d2", "line").await, None);
    assert!(rx.try_recv().is_err());
    assert_eq!(publisher.metrics().snapshot().lookup_failures, 1);
}

#[tokio::test]
async fn test_lookup_timeout_skipped() {
    let (hub, _rx) = subscribed_hub("acme");
    let publisher = FanoutPublisher::new(Arc::new(SlowDirectory), hub)
        .with_lookup_timeout(Duration::from_millis(20));

    assert_eq!(publisher.publish_one("d1", "line").await, None);
    assert_eq!(publisher.metrics().snapshot().lookup_timeouts, 1);
}

#[tokio::test]
async fn test_spawned_task_preserves_order() {
    let (hub, mut rx) = subscribed_hub("acme");
    let directory = Arc::new(StaticDirectory::new().with_route("d1", "p1", "acme"));
    let (handle, task) = FanoutPublisher::new(directory, hub).spawn(16);

    for line in ["one", "two", "three"] {
        assert!(handle.submit(&LogEvent::new("d1", line)));
    }
    drop(handle);
    task.await.unwrap();

    let received: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|m| m.to_string())
        .collect();
    assert_eq!(received, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_full_queue_drops_live_copy() {
    let (hub, _rx) = subscribed_hub("acme");
    let publisher = FanoutPublisher::new(Arc::new(SlowDirectory), hub)
        .with_lookup_timeout(Duration::from_secs(5));
    let (handle, task) = publisher.spawn(1);

    // The task may pick up the first item; at most two fit before dropping
    let accepted = (0..10)
        .filter(|i| handle.submit(&LogEvent::new("d1", format!("line {i}"))))
        .count();

    assert!(accepted <= 2);
    assert_eq!(handle.metrics().snapshot().queue_full, (10 - accepted) as u64);
    task.abort();
}

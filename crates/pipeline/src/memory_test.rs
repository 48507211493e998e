//! Tests for the in-memory transport

use super::*;

fn transport() -> MemoryTransport {
    MemoryTransport::new("container-logs").with_linger(Duration::from_millis(5))
}

#[tokio::test]
async fn test_poll_groups_by_partition_in_offset_order() {
    let log = transport();
    log.produce(0, "a");
    log.produce(1, "b");
    log.produce(0, "c");

    let batches = log.poll().await.unwrap();
    assert_eq!(batches.len(), 2);

    let p0 = &batches[0];
    assert_eq!(p0.partition, 0);
    assert_eq!(p0.messages.iter().map(|m| m.offset).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(p0.messages[1].payload.as_deref(), Some(&b"c"[..]));
    assert_eq!(batches[1].partition, 1);

    // Everything was handed out
    assert!(log.poll().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_max_batch_size() {
    let log = transport().with_max_batch_size(2);
    for i in 0..5 {
        log.produce(0, format!("{i}"));
    }

    assert_eq!(log.poll().await.unwrap()[0].last_offset(), Some(1));
    assert_eq!(log.poll().await.unwrap()[0].last_offset(), Some(3));
    assert_eq!(log.poll().await.unwrap()[0].last_offset(), Some(4));
}

#[tokio::test]
async fn test_poll_wakes_on_produce() {
    let log = std::sync::Arc::new(MemoryTransport::new("t").with_linger(Duration::from_secs(5)));
    let producer = std::sync::Arc::clone(&log);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        producer.produce(0, "late");
    });

    let started = std::time::Instant::now();
    let batches = log.poll().await.unwrap();
    assert_eq!(batches.len(), 1);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_commits_recorded_and_never_decrease() {
    let log = transport();
    log.produce(0, "a");
    log.produce(0, "b");

    log.commit("container-logs", 0, 2).await.unwrap();
    log.commit("container-logs", 0, 1).await.unwrap();

    assert_eq!(log.committed(0), Some(2));
    assert_eq!(log.commit_history(0), vec![2, 1]);
}

#[tokio::test]
async fn test_injected_commit_failure() {
    let log = transport();
    log.produce(0, "a");
    log.fail_commits(1);

    let err = log.commit("container-logs", 0, 1).await.unwrap_err();
    assert!(matches!(err, TransportError::CommitFailed { .. }));
    assert_eq!(log.committed(0), None);

    log.commit("container-logs", 0, 1).await.unwrap();
    assert_eq!(log.committed(0), Some(1));
}

#[tokio::test]
async fn test_restart_resumes_at_committed_offset() {
    let log = transport();
    for line in ["a", "b", "c"] {
        log.produce(0, line);
    }
    let first = log.poll().await.unwrap();
    log.commit("container-logs", 0, 1).await.unwrap();

    log.close().await.unwrap();
    assert!(matches!(log.poll().await, Err(TransportError::Closed)));

    log.restart();
    let again = log.poll().await.unwrap();
    assert_eq!(again[0].messages[0].offset, 1);
    assert_eq!(again[0].len(), 2);
    assert!(again[0].generation > first[0].generation);
}

#[tokio::test]
async fn test_revoke_fails_old_generation_heartbeat() {
    let log = transport();
    log.produce(0, "a");
    let batch = log.poll().await.unwrap().remove(0);

    log.heartbeat("container-logs", 0, batch.generation).await.unwrap();
    log.revoke(0);

    let err = log
        .heartbeat("container-logs", 0, batch.generation)
        .await
        .unwrap_err();
    assert!(err.is_revoked());

    // Uncommitted message is handed out again under the new generation
    let redelivered = log.poll().await.unwrap().remove(0);
    assert_eq!(redelivered.messages[0].offset, 0);
    log.heartbeat("container-logs", 0, redelivered.generation)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_produce_event_payload_decodes() {
    let log = transport();
    log.produce_event(3, &LogEvent::new("d1", "Build started"));

    let batch = log.poll().await.unwrap().remove(0);
    let event = LogEvent::from_payload(batch.messages[0].payload.as_deref()).unwrap();
    assert_eq!(event.deployment_id, "d1");
    assert_eq!(event.log_line, "Build started");
    assert_eq!(log.len(3), 1);
}

#[tokio::test]
async fn test_paused_partition_skipped_until_resumed() {
    let log = transport();
    log.produce(0, "a");
    log.produce(1, "b");

    log.pause("container-logs", 0).unwrap();
    assert!(log.is_paused(0));
    let batches = log.poll().await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].partition, 1);
    assert!(log.poll().await.unwrap().is_empty());

    log.resume("container-logs", 0).unwrap();
    let batches = log.poll().await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].partition, 0);
    assert_eq!(log.pause_count(), 1);
}

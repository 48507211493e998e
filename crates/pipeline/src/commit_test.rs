//! Tests for the commit coordinator

use super::*;

#[test]
fn test_new_has_nothing_to_commit() {
    let coordinator = CommitCoordinator::new(1, 10);
    assert_eq!(coordinator.pending_commit(), None);
    assert_eq!(coordinator.generation(), 1);
    assert!(!coordinator.should_flush());
}

#[test]
fn test_advance_moves_watermark_past_offset() {
    let mut coordinator = CommitCoordinator::new(0, 10);
    coordinator.settle(10, Settlement::Advance);
    coordinator.settle(11, Settlement::Advance);

    assert_eq!(coordinator.watermark(), Some(12));
    assert_eq!(coordinator.pending_commit(), Some(12));
}

#[test]
fn test_failed_write_holds_watermark() {
    let mut coordinator = CommitCoordinator::new(0, 10);
    coordinator.settle(10, Settlement::Advance);
    coordinator.settle(11, Settlement::Advance);
    coordinator.settle(12, Settlement::Hold);
    coordinator.settle(13, Settlement::Advance);
    coordinator.settle(14, Settlement::Advance);

    assert_eq!(coordinator.held_at(), Some(12));
    assert_eq!(coordinator.watermark(), Some(12));
    assert_eq!(coordinator.pending_commit(), Some(12));
}

#[test]
fn test_failure_on_first_message_commits_nothing_new() {
    let mut coordinator = CommitCoordinator::new(0, 10);
    coordinator.settle(5, Settlement::Hold);
    coordinator.settle(6, Settlement::Advance);

    // Committing 5 re-commits the start position; no message is covered
    assert_eq!(coordinator.pending_commit(), Some(5));
    coordinator.mark_committed(5);
    assert_eq!(coordinator.pending_commit(), None);
}

#[test]
fn test_hold_persists_across_batches() {
    let mut coordinator = CommitCoordinator::new(0, 1);
    coordinator.settle(0, Settlement::Hold);
    coordinator.mark_committed(0);
    coordinator.flushed();

    for offset in 1..100 {
        coordinator.settle(offset, Settlement::Advance);
    }
    assert_eq!(coordinator.pending_commit(), None);
}

#[test]
fn test_committed_never_lowered() {
    let mut coordinator = CommitCoordinator::new(0, 10);
    coordinator.mark_committed(20);
    coordinator.mark_committed(15);
    assert_eq!(coordinator.committed(), Some(20));

    // Redelivered older offsets do not produce a lower commit
    coordinator.settle(16, Settlement::Advance);
    assert_eq!(coordinator.pending_commit(), None);
}

#[test]
fn test_watermark_never_lowered() {
    let mut coordinator = CommitCoordinator::new(0, 10);
    coordinator.settle(30, Settlement::Advance);
    coordinator.settle(25, Settlement::Advance);
    assert_eq!(coordinator.watermark(), Some(31));
}

#[test]
fn test_should_flush_after_commit_every() {
    let mut coordinator = CommitCoordinator::new(0, 3);
    coordinator.settle(0, Settlement::Advance);
    coordinator.settle(1, Settlement::Advance);
    assert!(!coordinator.should_flush());

    coordinator.settle(2, Settlement::Advance);
    assert!(coordinator.should_flush());

    coordinator.flushed();
    assert!(!coordinator.should_flush());
}

#[test]
fn test_zero_commit_every_treated_as_one() {
    let mut coordinator = CommitCoordinator::new(0, 0);
    coordinator.settle(0, Settlement::Advance);
    assert!(coordinator.should_flush());
}

#[test]
fn test_reset_clears_hold() {
    let mut coordinator = CommitCoordinator::new(1, 10);
    coordinator.settle(4, Settlement::Hold);
    coordinator.mark_committed(4);

    coordinator.reset(2);

    assert_eq!(coordinator.generation(), 2);
    assert_eq!(coordinator.held_at(), None);
    assert_eq!(coordinator.committed(), None);
    coordinator.settle(4, Settlement::Advance);
    assert_eq!(coordinator.pending_commit(), Some(5));
}

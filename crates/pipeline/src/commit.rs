//! Commit coordinator - per-partition commit watermark
//!
//! Messages of a partition settle in offset order. The watermark is the
//! offset right after the longest settled prefix in which every message was
//! either durably written or skipped as malformed. The first failed write
//! pins the watermark at its own offset for the rest of the assignment, so
//! a restarted consumer redelivers it (and everything after it).
//!
//! ```text
//! offsets     10   11   12   13   14
//! outcome     W    M    F    W    W
//! watermark   11   12   12   12   12     (F = failed write pins at 12)
//! ```
//!
//! Commits are only ever issued for a watermark above the last committed
//! offset, so committed offsets never decrease.

/// How a message settled, as far as committing is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Durably written or intentionally skipped
    Advance,
    /// Write failed; must be redelivered
    Hold,
}

/// Commit watermark for one partition assignment
#[derive(Debug, Clone)]
pub struct CommitCoordinator {
    /// Assignment epoch this state belongs to
    generation: u64,
    /// Next offset a commit may cover
    watermark: Option<i64>,
    /// Last offset acknowledged by the transport
    committed: Option<i64>,
    /// First offset whose write failed
    held_at: Option<i64>,
    /// Messages settled since the last flush
    pending: usize,
    /// Flush after this many settled messages
    commit_every: usize,
}

impl CommitCoordinator {
    /// Create a coordinator for a fresh assignment
    pub fn new(generation: u64, commit_every: usize) -> Self {
        Self {
            generation,
            watermark: None,
            committed: None,
            held_at: None,
            pending: 0,
            commit_every: commit_every.max(1),
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Forget all state and start a new assignment
    pub fn reset(&mut self, generation: u64) {
        *self = Self::new(generation, self.commit_every);
    }

    /// Record the outcome of one message
    pub fn settle(&mut self, offset: i64, settlement: Settlement) {
        self.pending += 1;

        if self.held_at.is_some() {
            return;
        }

        match settlement {
            Settlement::Advance => {
                let next = offset + 1;
                if self.watermark.is_none_or(|w| next > w) {
                    self.watermark = Some(next);
                }
            }
            Settlement::Hold => {
                self.held_at = Some(offset);
                if self.watermark.is_none_or(|w| offset > w) {
                    self.watermark = Some(offset);
                }
            }
        }
    }

    /// Whether enough messages settled to warrant a commit
    #[inline]
    pub fn should_flush(&self) -> bool {
        self.pending >= self.commit_every
    }

    /// Offset to commit now, if the watermark moved past the last commit
    pub fn pending_commit(&self) -> Option<i64> {
        match (self.watermark, self.committed) {
            (Some(w), Some(c)) if w <= c => None,
            (w, _) => w,
        }
    }

    /// Record an acknowledged commit
    pub fn mark_committed(&mut self, next_offset: i64) {
        if self.committed.is_none_or(|c| next_offset > c) {
            self.committed = Some(next_offset);
        }
    }

    /// Start counting towards the next flush
    #[inline]
    pub fn flushed(&mut self) {
        self.pending = 0;
    }

    /// Current watermark
    #[inline]
    pub fn watermark(&self) -> Option<i64> {
        self.watermark
    }

    /// Last acknowledged commit
    #[inline]
    pub fn committed(&self) -> Option<i64> {
        self.committed
    }

    /// Offset of the first failed write, if any
    #[inline]
    pub fn held_at(&self) -> Option<i64> {
        self.held_at
    }
}

#[cfg(test)]
#[path = "commit_test.rs"]
mod tests;

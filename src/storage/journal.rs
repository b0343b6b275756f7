//! Journal trait with explicit safety contracts.
//!
//! The journal is the follower's append-only, index-addressed log.
//! Implementers MUST adhere to the documented invariants: the follower's
//! correctness argument (log matching, commit monotonicity) rests on them.

use std::ops::RangeInclusive;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use crate::Result;
use crate::messages::Entry;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Journal: Send + Sync + 'static {
    /// Returns the smallest live index (inclusive). Entries below it have
    /// been compacted into a snapshot.
    ///
    /// # Safety Invariants
    /// - MUST be monotonically non-decreasing (can only increase via purge)
    /// - MUST be <= max_index()
    fn min_index(&self) -> u64;

    /// Returns one past the largest live index.
    ///
    /// # Safety Invariants
    /// - Can decrease only during conflict resolution (compare_or_append)
    /// - MUST be >= min_index()
    fn max_index(&self) -> u64;

    /// Returns one past the highest committed index.
    ///
    /// # Safety Invariants
    /// - MUST be monotonically non-decreasing
    /// - MUST be <= max_index()
    fn commit_index(&self) -> u64;

    /// Returns the term of the entry at `index`.
    ///
    /// # Errors
    /// - [`JournalError::IndexUnderflow`](crate::JournalError::IndexUnderflow)
    ///   if `index < min_index()` (the entry was compacted away)
    /// - [`JournalError::IndexOverflow`](crate::JournalError::IndexOverflow)
    ///   if `index >= max_index()`
    fn term_at(
        &self,
        index: u64,
    ) -> Result<u64>;

    /// Retrieves a contiguous range of entries, clamped to the live window.
    ///
    /// # Safety Invariants
    /// - Returned entries MUST be ordered by index (ascending), without gaps
    fn entries_range(
        &self,
        range: RangeInclusive<u64>,
    ) -> Result<Vec<Entry>>;

    /// Walks `entries` against existing journal positions from
    /// `start_index`. At the first position where the terms differ or the
    /// journal ends, truncates the journal there and appends the remaining
    /// suffix. A batch that already matches is a no-op.
    ///
    /// # Errors
    /// - [`JournalError::TruncateCommitted`](crate::JournalError::TruncateCommitted)
    ///   if resolution would drop a committed entry; the journal MUST be
    ///   left unmodified
    ///
    /// # Safety Invariants
    /// - MUST be atomic with respect to the observable indices: a failed
    ///   call leaves min/max/commit untouched
    async fn compare_or_append(
        &self,
        entries: Vec<Entry>,
        start_index: u64,
    ) -> Result<()>;

    /// Advances the commit point to `up_to` (exclusive). Moving backwards is
    /// a no-op; moving past `max_index()` is an error.
    async fn commit(
        &self,
        up_to: u64,
    ) -> Result<()>;
}

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::Deserialize;
use serde::Serialize;

/// Metadata of one snapshot, keyed in the [`SnapshotIndex`] by its boundary
/// index (one past the last entry folded into the snapshot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Term of the last entry covered by this snapshot.
    pub last_included_term: u64,
}

/// Ordered map of the snapshots known to this node.
///
/// Owned and populated by the surrounding server; the follower only reads
/// the first (lowest-boundary) entry, to answer term probes for the position
/// immediately below the live journal.
#[derive(Debug, Default)]
pub struct SnapshotIndex {
    snapshots: RwLock<BTreeMap<u64, SnapshotMeta>>,
}

impl SnapshotIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// An index holding only the genesis snapshot: boundary `0`, term `0`.
    /// Every freshly bootstrapped node starts from this state.
    pub fn genesis() -> Self {
        let index = Self::new();
        index.insert(0, SnapshotMeta {
            last_included_term: 0,
        });
        index
    }

    pub fn insert(
        &self,
        boundary: u64,
        meta: SnapshotMeta,
    ) {
        self.snapshots.write().insert(boundary, meta);
    }

    /// Drops snapshots with boundaries below `boundary`, mirroring
    /// compaction on the snapshot side.
    pub fn remove_below(
        &self,
        boundary: u64,
    ) {
        self.snapshots.write().retain(|key, _| *key >= boundary);
    }

    /// The lowest snapshot boundary and its metadata.
    pub fn first(&self) -> Option<(u64, SnapshotMeta)> {
        self.snapshots
            .read()
            .first_key_value()
            .map(|(boundary, meta)| (*boundary, *meta))
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}

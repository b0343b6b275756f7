use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use parking_lot::RwLock;

use super::ConfigState;

/// State shared between the follower, the external state-machine applier
/// and the surrounding server's membership queries.
///
/// The applier advances `last_applied` as it drains committed entries; the
/// follower only reads it for log context. The config state is mutated by
/// the follower's handler loop alone during the follower's lifetime.
#[derive(Debug, Default)]
pub struct ReplicaState {
    config: RwLock<ConfigState>,
    last_applied: AtomicU64,
}

impl ReplicaState {
    pub fn new(config: ConfigState) -> Self {
        Self {
            config: RwLock::new(config),
            last_applied: AtomicU64::new(0),
        }
    }

    pub fn config_state(&self) -> &RwLock<ConfigState> {
        &self.config
    }

    pub fn last_applied(&self) -> u64 {
        self.last_applied.load(Ordering::SeqCst)
    }

    /// Called by the applier after entries up to `index` (exclusive) have
    /// been applied.
    pub fn advance_last_applied(
        &self,
        index: u64,
    ) {
        self.last_applied.fetch_max(index, Ordering::SeqCst);
    }
}

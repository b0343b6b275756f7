//! Error hierarchy for the follower replication core, categorised by the
//! subsystem an error originates from.

use config::ConfigError;

use crate::follower::LifecycleState;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Journal access and mutation failures
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Cluster membership bookkeeping failures
    #[error(transparent)]
    Membership(#[from] MembershipError),

    /// Operations refused by the follower's lifecycle state
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Worker registry misuse or worker failures
    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unrecoverable failures requiring operator attention
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// Probed index lies below the live journal range. Signed so the probe
    /// before the first entry ever written (`-1`) is representable.
    #[error("index {index} underflows the journal, live range starts at {min_index}")]
    IndexUnderflow { index: i64, min_index: u64 },

    #[error("index {index} overflows the journal, live range ends at {max_index}")]
    IndexOverflow { index: u64, max_index: u64 },

    /// Conflict resolution tried to drop entries at or below the commit
    /// point. Always fatal: committed entries must never be removed.
    #[error("truncating at {index} would drop committed entries, commit index is {commit_index}")]
    TruncateCommitted { index: u64, commit_index: u64 },

    #[error("commit point {index} exceeds journal max index {max_index}")]
    CommitBeyondMax { index: u64, max_index: u64 },

    /// Disk I/O failures from persistent journal implementations
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    /// The uncommitted journal tail held more than one configuration change.
    /// The leader must never replicate a second change while one is in
    /// flight, so this indicates a protocol violation upstream.
    #[error("multiple uncommitted configuration changes found in the journal tail")]
    MultiplePendingChanges,
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("follower is not running, state: {state:?}")]
    NotRunning { state: LifecycleState },

    #[error("invalid lifecycle transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("worker {0} is not registered")]
    NotFound(String),

    #[error("worker {0} is already registered")]
    AlreadyRegistered(String),

    #[error("worker {0} is already started")]
    AlreadyStarted(String),

    #[error("worker {0} is not started")]
    NotStarted(String),

    #[error("worker {0} is still running, stop it before removal")]
    StillRunning(String),

    #[error("worker {0} failed to join: {1}")]
    JoinFailed(String, String),
}

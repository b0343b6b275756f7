use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::sleep;
use tracing::debug;
use tracing::info;

use crate::LifecycleError;
use crate::Result;
use crate::TypeConfig;
use crate::alias::JOF;
use crate::alias::WOF;
use crate::config::ReplicaConfig;
use crate::membership::ConfigReconciler;
use crate::membership::ReplicaState;
use crate::messages::AppendEntriesRequest;
use crate::replication::PendingRequest;
use crate::replication::ReplicationCompletion;
use crate::replication::ReplicationProcessor;
use crate::replication::ReplicationQueue;
use crate::storage::SnapshotIndex;
use crate::workers::VOTER_REPLICATION_HANDLER_WORKER;
use crate::workers::WorkerDescriptor;
use crate::workers::WorkerRegistry;
use crate::workers::worker_name;

/// Lifecycle of a follower instance.
///
/// A follower lives exactly as long as the node stays in the follower role
/// for one term; the outer role manager constructs it on entry and destroys
/// it on exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Running,
    Stopping,
    Stopped,
}

/// The passive replica of the replicated journal.
///
/// Accepts ordered batches of entries from the leader, reconciles them
/// against the local journal through a single background handler worker, and
/// signals the external state-machine applier whenever the commit point
/// advances.
///
/// # Type Parameters
/// - `T`: deployment-specific collaborator wiring
pub struct Follower<T: TypeConfig> {
    journal: Arc<JOF<T>>,
    state: Arc<ReplicaState>,
    server_uri: String,
    current_term: u64,
    reconciler: Arc<ConfigReconciler>,
    workers: Arc<WOF<T>>,
    snapshots: Arc<SnapshotIndex>,
    config: Arc<ReplicaConfig>,

    queue: Arc<ReplicationQueue>,
    /// Highest journal tail the leader has reported; `None` until the first
    /// accepted request.
    leader_max_index: Arc<RwLock<Option<u64>>>,
    ready_for_preferred_leader_election: AtomicBool,
    lifecycle: RwLock<LifecycleState>,
}

impl<T: TypeConfig> Follower<T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        journal: Arc<JOF<T>>,
        state: Arc<ReplicaState>,
        server_uri: String,
        current_term: u64,
        reconciler: Arc<ConfigReconciler>,
        workers: Arc<WOF<T>>,
        snapshots: Arc<SnapshotIndex>,
        config: Arc<ReplicaConfig>,
    ) -> Self {
        let queue = Arc::new(ReplicationQueue::with_capacity(
            config.replication.cached_requests,
        ));
        Self {
            journal,
            state,
            server_uri,
            current_term,
            reconciler,
            workers,
            snapshots,
            config,
            queue,
            leader_max_index: Arc::new(RwLock::new(None)),
            ready_for_preferred_leader_election: AtomicBool::new(false),
            lifecycle: RwLock::new(LifecycleState::Created),
        }
    }

    /// Registers and starts the replication handler worker, then opens
    /// admission.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.write();
        if *lifecycle != LifecycleState::Created {
            return Err(LifecycleError::InvalidTransition {
                from: *lifecycle,
                to: LifecycleState::Running,
            }
            .into());
        }

        let processor = ReplicationProcessor::<T>::new(
            self.queue.clone(),
            self.journal.clone(),
            self.state.clone(),
            self.reconciler.clone(),
            self.workers.clone(),
            self.snapshots.clone(),
            self.leader_max_index.clone(),
            self.server_uri.clone(),
            self.current_term,
        );
        let name = self.handler_worker_name();
        self.workers
            .create_worker(WorkerDescriptor::new(name.clone(), Box::new(processor)))?;
        self.workers.start_worker(&name)?;

        *lifecycle = LifecycleState::Running;
        info!(uri = %self.server_uri, current_term = self.current_term, "follower started");
        Ok(())
    }

    /// Closes admission, waits for every accepted request to be handled,
    /// then stops and deregisters the handler worker.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut lifecycle = self.lifecycle.write();
            if *lifecycle != LifecycleState::Running {
                return Err(LifecycleError::InvalidTransition {
                    from: *lifecycle,
                    to: LifecycleState::Stopping,
                }
                .into());
            }
            *lifecycle = LifecycleState::Stopping;
        }

        let poll_interval = Duration::from_millis(self.config.replication.drain_poll_interval_ms);
        while !self.queue.is_empty() {
            sleep(poll_interval).await;
        }

        let name = self.handler_worker_name();
        self.workers.stop_worker(&name).await?;
        self.workers.remove_worker(&name)?;

        *self.lifecycle.write() = LifecycleState::Stopped;
        info!(uri = %self.server_uri, "follower stopped");
        Ok(())
    }

    /// Queues an append-entries request for the handler loop, returning its
    /// completion handle.
    ///
    /// When the follower is not running the completion resolves immediately
    /// with a lifecycle error and nothing is enqueued. Completions resolve
    /// in handler-loop order, which is not submission order.
    pub fn submit(
        &self,
        request: AppendEntriesRequest,
    ) -> ReplicationCompletion {
        let (pending, completion) = PendingRequest::new(request);
        let lifecycle = *self.lifecycle.read();
        if lifecycle == LifecycleState::Running {
            self.queue.push(pending);
        } else {
            debug!(state = ?lifecycle, "refusing append entries request, follower not running");
            pending.complete(Err(LifecycleError::NotRunning { state: lifecycle }.into()));
        }
        completion
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        *self.lifecycle.read()
    }

    /// Highest journal tail the leader has reported so far.
    pub fn leader_max_index(&self) -> Option<u64> {
        *self.leader_max_index.read()
    }

    pub fn replication_queue_size(&self) -> usize {
        self.queue.len()
    }

    pub fn is_ready_for_preferred_leader_election(&self) -> bool {
        self.ready_for_preferred_leader_election.load(Ordering::SeqCst)
    }

    pub fn set_ready_for_preferred_leader_election(
        &self,
        ready: bool,
    ) {
        self.ready_for_preferred_leader_election.store(ready, Ordering::SeqCst);
    }

    fn handler_worker_name(&self) -> String {
        worker_name(&self.server_uri, VOTER_REPLICATION_HANDLER_WORKER)
    }
}

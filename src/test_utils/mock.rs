//! Ready-made collaborator wirings for unit and integration tests.
//!
//! Two flavours:
//! - [`MockTypeConfig`] pairs the mockall-generated journal and registry for
//!   scripted, interaction-checking tests of the handler;
//! - [`MemTypeConfig`] pairs the in-memory journal with the tokio worker
//!   registry for end-to-end follower tests with real queueing and real
//!   workers.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use tokio::select;

use crate::Result;
use crate::TypeConfig;
use crate::config::ReplicaConfig;
use crate::follower::Follower;
use crate::membership::ConfigReconciler;
use crate::membership::ConfigState;
use crate::membership::ReplicaState;
use crate::storage::MemJournal;
use crate::storage::MockJournal;
use crate::storage::SnapshotIndex;
use crate::workers::MockWorkerRegistry;
use crate::workers::STATE_MACHINE_WORKER;
use crate::workers::TokioWorkerRegistry;
use crate::workers::Worker;
use crate::workers::WorkerContext;
use crate::workers::WorkerDescriptor;
use crate::workers::WorkerRegistry;
use crate::workers::worker_name;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MockTypeConfig;

impl TypeConfig for MockTypeConfig {
    type J = MockJournal;
    type W = MockWorkerRegistry;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemTypeConfig;

impl TypeConfig for MemTypeConfig {
    type J = MemJournal;
    type W = TokioWorkerRegistry;
}

/// Stand-in for the external state-machine applier: counts the wakeups the
/// follower sends it.
pub struct CountingApplier {
    wakeups: Arc<AtomicUsize>,
}

impl CountingApplier {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let wakeups = Arc::new(AtomicUsize::new(0));
        (
            Self {
                wakeups: wakeups.clone(),
            },
            wakeups,
        )
    }
}

#[async_trait]
impl Worker for CountingApplier {
    async fn run(
        &mut self,
        context: WorkerContext,
    ) -> Result<()> {
        let mut shutdown = context.shutdown;
        loop {
            select! {
                _ = shutdown.changed() => return Ok(()),
                _ = context.wakeup.notified() => {
                    self.wakeups.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
    }
}

/// A follower wired onto in-memory collaborators, with a counting applier
/// already registered under `"<uri>-state-machine"`.
pub struct MemFixture {
    pub follower: Follower<MemTypeConfig>,
    pub journal: Arc<MemJournal>,
    pub state: Arc<ReplicaState>,
    pub workers: Arc<TokioWorkerRegistry>,
    pub snapshots: Arc<SnapshotIndex>,
    pub applier_wakeups: Arc<AtomicUsize>,
}

pub fn mem_fixture(
    server_uri: &str,
    current_term: u64,
) -> MemFixture {
    let journal = Arc::new(MemJournal::new());
    let state = Arc::new(ReplicaState::new(ConfigState::new(vec![
        server_uri.to_string(),
    ])));
    let workers = Arc::new(TokioWorkerRegistry::new());
    let snapshots = Arc::new(SnapshotIndex::genesis());

    let (applier, applier_wakeups) = CountingApplier::new();
    let applier_name = worker_name(server_uri, STATE_MACHINE_WORKER);
    workers
        .create_worker(WorkerDescriptor::new(applier_name.clone(), Box::new(applier)))
        .expect("applier registration should succeed");
    workers.start_worker(&applier_name).expect("applier should start");

    let follower = Follower::<MemTypeConfig>::new(
        journal.clone(),
        state.clone(),
        server_uri.to_string(),
        current_term,
        Arc::new(ConfigReconciler::new()),
        workers.clone(),
        snapshots.clone(),
        Arc::new(replica_config()),
    );

    MemFixture {
        follower,
        journal,
        state,
        workers,
        snapshots,
        applier_wakeups,
    }
}

pub fn replica_config() -> ReplicaConfig {
    ReplicaConfig::new()
        .expect("ReplicaConfig should be inited successfully.")
        .validate()
        .expect("default ReplicaConfig should validate")
}

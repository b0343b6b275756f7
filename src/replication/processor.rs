use std::cmp;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::select;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::PendingRequest;
use super::ReplicationQueue;
use crate::Error;
use crate::JournalError;
use crate::Result;
use crate::TypeConfig;
use crate::alias::JOF;
use crate::alias::WOF;
use crate::membership::ConfigReconciler;
use crate::membership::ReplicaState;
use crate::messages::AppendEntriesRequest;
use crate::messages::AppendEntriesResponse;
use crate::storage::Journal;
use crate::storage::SnapshotIndex;
use crate::workers::STATE_MACHINE_WORKER;
use crate::workers::Worker;
use crate::workers::WorkerContext;
use crate::workers::WorkerRegistry;
use crate::workers::worker_name;

/// The follower half of append-entries handling.
///
/// Runs as the single registered replication worker and is the sole journal
/// writer on the follower path: it dequeues one pending request at a time
/// and performs validate → reconcile → commit, completing the request's
/// handle with the outcome.
pub(crate) struct ReplicationProcessor<T: TypeConfig> {
    queue: Arc<ReplicationQueue>,
    journal: Arc<JOF<T>>,
    state: Arc<ReplicaState>,
    reconciler: Arc<ConfigReconciler>,
    workers: Arc<WOF<T>>,
    snapshots: Arc<SnapshotIndex>,
    leader_max_index: Arc<RwLock<Option<u64>>>,
    server_uri: String,
    current_term: u64,
}

#[async_trait]
impl<T: TypeConfig> Worker for ReplicationProcessor<T> {
    async fn run(
        &mut self,
        context: WorkerContext,
    ) -> Result<()> {
        info!(worker = %context.name, "replication handler started");
        let mut shutdown = context.shutdown;

        loop {
            select! {
                _ = shutdown.changed() => {
                    info!(worker = %context.name, "replication handler shutdown signal received");
                    return Ok(());
                }
                pending = self.queue.take() => {
                    // A dequeued request always runs to completion; shutdown
                    // can only land on the idle wait above.
                    self.handle(pending).await;
                }
            }
        }
    }
}

impl<T: TypeConfig> ReplicationProcessor<T> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        queue: Arc<ReplicationQueue>,
        journal: Arc<JOF<T>>,
        state: Arc<ReplicaState>,
        reconciler: Arc<ConfigReconciler>,
        workers: Arc<WOF<T>>,
        snapshots: Arc<SnapshotIndex>,
        leader_max_index: Arc<RwLock<Option<u64>>>,
        server_uri: String,
        current_term: u64,
    ) -> Self {
        Self {
            queue,
            journal,
            state,
            reconciler,
            workers,
            snapshots,
            leader_max_index,
            server_uri,
            current_term,
        }
    }

    /// Handles one dequeued request and resolves its completion exactly
    /// once.
    pub(crate) async fn handle(
        &self,
        pending: PendingRequest,
    ) {
        let prev_log_index = pending.request.prev_log_index;
        let prev_log_term = pending.request.prev_log_term;
        let entry_count = pending.request.entries.len();
        let min_index = self.journal.min_index();
        let max_index = self.journal.max_index();

        // Reply false if the journal holds no entry at prev_log_index whose
        // term matches prev_log_term.
        if prev_log_index < min_index as i64 - 1 || prev_log_index >= max_index as i64 {
            trace!(
                prev_log_index,
                min_index,
                max_index,
                "probe point outside journal window, rejecting"
            );
            pending.complete(Ok(AppendEntriesResponse::rejected(
                (prev_log_index + 1).max(0) as u64,
                self.current_term,
                entry_count,
            )));
            return;
        }

        match self.probe_term(prev_log_index) {
            Ok(term) if term == prev_log_term => {}
            Ok(term) => {
                debug!(
                    prev_log_index,
                    prev_log_term,
                    journal_term = term,
                    "terms disagree at probe point, rejecting"
                );
                pending.complete(Ok(AppendEntriesResponse::rejected(
                    (prev_log_index + 1) as u64,
                    self.current_term,
                    entry_count,
                )));
                return;
            }
            Err(e) => {
                debug!(prev_log_index, error = ?e, "term probe failed");
                pending.complete(Err(e));
                return;
            }
        }

        match self.apply(&pending.request).await {
            Ok(response) => pending.complete(Ok(response)),
            Err(e) => {
                warn!(
                    term = pending.request.term,
                    leader = %pending.request.leader,
                    prev_log_index,
                    prev_log_term,
                    entries = entry_count,
                    leader_commit = pending.request.leader_commit,
                    current_term = self.current_term,
                    min_index,
                    max_index = self.journal.max_index(),
                    commit_index = self.journal.commit_index(),
                    last_applied = self.state.last_applied(),
                    uri = %self.server_uri,
                    error = ?e,
                    "append entries request failed"
                );
                pending.complete(Err(e));
            }
        }
    }

    /// Reconciles, appends, advances the commit point and tracks the
    /// leader's tail for one validated request.
    async fn apply(
        &self,
        request: &AppendEntriesRequest,
    ) -> Result<AppendEntriesResponse> {
        // If an existing entry conflicts with a new one (same index but
        // different terms), delete the existing entry and all that follow
        // it, then append any new entries not already in the journal.
        if !request.entries.is_empty() {
            let start_index = (request.prev_log_index + 1) as u64;

            // Truncation may drop an uncommitted config entry; the live
            // config must be rolled back first.
            self.reconciler.maybe_rollback_config(
                start_index,
                self.journal.as_ref(),
                self.state.config_state(),
            )?;

            self.journal
                .compare_or_append(request.entries.clone(), start_index)
                .await?;

            // Non-leader roles install replicated config changes
            // immediately, without waiting for commit.
            self.reconciler
                .maybe_update_non_leader_config(&request.entries, self.state.config_state())?;
        }

        // If leader_commit > commit_index, set commit_index =
        // min(leader_commit, max_index) and wake the applier.
        if request.leader_commit > self.journal.commit_index() {
            let commit_to = cmp::min(request.leader_commit, self.journal.max_index());
            self.journal.commit(commit_to).await?;
            self.workers
                .wakeup_worker(&worker_name(&self.server_uri, STATE_MACHINE_WORKER))?;
        }

        let mut leader_max_index = self.leader_max_index.write();
        if leader_max_index.map_or(true, |current| request.max_index > current) {
            *leader_max_index = Some(request.max_index);
        }
        drop(leader_max_index);

        Ok(AppendEntriesResponse::accepted(
            (request.prev_log_index + 1) as u64,
            self.current_term,
            request.entries.len(),
        ))
    }

    /// Term of the entry at `index`, answered from the head snapshot when
    /// the index sits exactly one below the first snapshot boundary.
    fn probe_term(
        &self,
        index: i64,
    ) -> Result<u64> {
        let probed = if index < 0 {
            Err(JournalError::IndexUnderflow {
                index,
                min_index: self.journal.min_index(),
            }
            .into())
        } else {
            self.journal.term_at(index as u64)
        };

        match probed {
            Err(Error::Journal(JournalError::IndexUnderflow {
                index: probe,
                min_index,
            })) => {
                if let Some((boundary, meta)) = self.snapshots.first() {
                    if index + 1 == boundary as i64 {
                        return Ok(meta.last_included_term);
                    }
                }
                Err(JournalError::IndexUnderflow {
                    index: probe,
                    min_index,
                }
                .into())
            }
            other => other,
        }
    }
}

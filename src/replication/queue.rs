use std::cmp::Ordering;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::sync::oneshot;
use tracing::trace;

use crate::Error;
use crate::messages::AppendEntriesRequest;
use crate::messages::AppendEntriesResponse;

/// Outcome delivered through a request's completion handle.
pub type AppendResult = std::result::Result<AppendEntriesResponse, Error>;

/// The handle returned by `submit`: resolves exactly once, with the
/// response, a protocol rejection, or an error.
pub type ReplicationCompletion = oneshot::Receiver<AppendResult>;

/// An accepted append-entries request paired with its completion sender.
///
/// Ordered by `(prev_log_term, prev_log_index)`: a straggler produced under
/// a deposed leader's term sorts before requests of a newer term at the same
/// prefix, so it can never overwrite entries already reconciled against the
/// newer leader.
pub struct PendingRequest {
    pub request: AppendEntriesRequest,
    completion: oneshot::Sender<AppendResult>,
}

impl PendingRequest {
    pub fn new(request: AppendEntriesRequest) -> (Self, ReplicationCompletion) {
        let (completion, receiver) = oneshot::channel();
        (
            Self {
                request,
                completion,
            },
            receiver,
        )
    }

    /// Resolves the completion. A dropped receiver is the submitter's
    /// business; the send result is deliberately ignored.
    pub fn complete(
        self,
        result: AppendResult,
    ) {
        let _ = self.completion.send(result);
    }

    fn sort_key(&self) -> (u64, i64) {
        (self.request.prev_log_term, self.request.prev_log_index)
    }
}

impl PartialEq for PendingRequest {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for PendingRequest {}

impl PartialOrd for PendingRequest {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingRequest {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Multi-producer / single-consumer priority buffer of pending requests.
///
/// Producers push from any task; the single handler loop awaits `take`.
/// Capacity is only an initial sizing hint, insertion never blocks.
pub struct ReplicationQueue {
    heap: Mutex<BinaryHeap<Reverse<PendingRequest>>>,
    available: Notify,
}

impl ReplicationQueue {
    pub fn with_capacity(cached_requests: usize) -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::with_capacity(cached_requests)),
            available: Notify::new(),
        }
    }

    pub fn push(
        &self,
        pending: PendingRequest,
    ) {
        let mut heap = self.heap.lock();
        heap.push(Reverse(pending));
        trace!(queued = heap.len(), "append entries request queued");
        drop(heap);
        self.available.notify_one();
    }

    /// Removes and returns the smallest-keyed pending request, waiting for
    /// one to arrive if the queue is empty. Cancel-safe: a cancelled take
    /// removes nothing.
    pub async fn take(&self) -> PendingRequest {
        loop {
            let notified = self.available.notified();
            if let Some(Reverse(pending)) = self.heap.lock().pop() {
                return pending;
            }
            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.lock().is_empty()
    }
}

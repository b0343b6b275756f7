use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Notify;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;

use super::Worker;
use super::WorkerContext;
use super::WorkerDescriptor;
use super::WorkerRegistry;
use crate::Result;
use crate::WorkerError;

/// Tokio-backed [`WorkerRegistry`]: every started worker runs as its own
/// task, stoppable through a `watch` channel and wakeable through a
/// [`Notify`].
#[derive(Debug, Default)]
pub struct TokioWorkerRegistry {
    workers: DashMap<String, WorkerSlot>,
}

struct WorkerSlot {
    /// Present until the worker is started; `start_worker` moves it into the
    /// spawned task.
    worker: Option<Box<dyn Worker>>,
    wakeup: Arc<Notify>,
    running: Option<RunningWorker>,
}

impl std::fmt::Debug for WorkerSlot {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WorkerSlot")
            .field("started", &self.running.is_some())
            .finish()
    }
}

struct RunningWorker {
    shutdown_tx: watch::Sender<()>,
    handle: JoinHandle<()>,
}

impl TokioWorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.workers.contains_key(name)
    }
}

#[async_trait]
impl WorkerRegistry for TokioWorkerRegistry {
    fn create_worker(
        &self,
        descriptor: WorkerDescriptor,
    ) -> Result<()> {
        let WorkerDescriptor { name, worker } = descriptor;
        if self.workers.contains_key(&name) {
            return Err(WorkerError::AlreadyRegistered(name).into());
        }

        debug!(worker = %name, "worker registered");
        self.workers.insert(name, WorkerSlot {
            worker: Some(worker),
            wakeup: Arc::new(Notify::new()),
            running: None,
        });
        Ok(())
    }

    fn start_worker(
        &self,
        name: &str,
    ) -> Result<()> {
        let mut slot = self
            .workers
            .get_mut(name)
            .ok_or_else(|| WorkerError::NotFound(name.to_string()))?;
        if slot.running.is_some() {
            return Err(WorkerError::AlreadyStarted(name.to_string()).into());
        }
        let mut worker = slot
            .worker
            .take()
            .ok_or_else(|| WorkerError::AlreadyStarted(name.to_string()))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let context = WorkerContext {
            name: name.to_string(),
            shutdown: shutdown_rx,
            wakeup: slot.wakeup.clone(),
        };

        let worker_name = name.to_string();
        let handle = tokio::spawn(async move {
            if let Err(e) = worker.run(context).await {
                error!(worker = %worker_name, error = ?e, "worker terminated with error");
            }
        });

        info!(worker = %name, "worker started");
        slot.running = Some(RunningWorker {
            shutdown_tx,
            handle,
        });
        Ok(())
    }

    async fn stop_worker(
        &self,
        name: &str,
    ) -> Result<()> {
        // Take the running half out of the slot before awaiting, so the map
        // shard is not held across the join.
        let running = {
            let mut slot = self
                .workers
                .get_mut(name)
                .ok_or_else(|| WorkerError::NotFound(name.to_string()))?;
            slot.running
                .take()
                .ok_or_else(|| WorkerError::NotStarted(name.to_string()))?
        };

        let _ = running.shutdown_tx.send(());
        running
            .handle
            .await
            .map_err(|e| WorkerError::JoinFailed(name.to_string(), format!("{e:?}")))?;

        info!(worker = %name, "worker stopped");
        Ok(())
    }

    fn remove_worker(
        &self,
        name: &str,
    ) -> Result<()> {
        let Some(slot) = self.workers.get(name) else {
            return Err(WorkerError::NotFound(name.to_string()).into());
        };
        if slot.running.is_some() {
            return Err(WorkerError::StillRunning(name.to_string()).into());
        }
        drop(slot);

        self.workers.remove(name);
        debug!(worker = %name, "worker removed");
        Ok(())
    }

    fn wakeup_worker(
        &self,
        name: &str,
    ) -> Result<()> {
        let slot = self
            .workers
            .get(name)
            .ok_or_else(|| WorkerError::NotFound(name.to_string()))?;
        slot.wakeup.notify_one();
        Ok(())
    }
}

//! Named background workers.
//!
//! The follower never holds handles to the tasks that collaborate with it;
//! it addresses them through a registry by well-known name. That keeps the
//! coupling loose: the state-machine applier is woken by name when the
//! commit point advances, and the replication handler itself is registered,
//! started and stopped by name through the follower's lifecycle.

mod registry;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;
pub use registry::*;
use tokio::sync::Notify;
use tokio::sync::watch;

use crate::Result;


/// Base name of the worker running the follower's replication handler loop.
pub const VOTER_REPLICATION_HANDLER_WORKER: &str = "voter-replication-handler";

/// Base name of the external state-machine applier worker.
pub const STATE_MACHINE_WORKER: &str = "state-machine";

/// Worker names are namespaced by the owning server's URI so several nodes
/// can share one registry in tests and embedded deployments.
pub fn worker_name(
    server_uri: &str,
    base_name: &str,
) -> String {
    format!("{server_uri}-{base_name}")
}

/// Runtime handles passed to a worker when it starts.
pub struct WorkerContext {
    pub name: String,
    /// Resolves when the registry stops this worker. Long-running loops
    /// select on it while idle.
    pub shutdown: watch::Receiver<()>,
    /// Signalled by [`WorkerRegistry::wakeup_worker`]. Workers that sleep
    /// between rounds wait on it.
    pub wakeup: Arc<Notify>,
}

/// A unit of background work with its own run loop.
///
/// `run` owns its loop entirely: it selects between the shutdown signal and
/// its work source, and returns once shutdown resolves. Work taken from a
/// source must be finished before the next select, so stopping a worker can
/// only interrupt it while idle.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    async fn run(
        &mut self,
        context: WorkerContext,
    ) -> Result<()>;
}

/// Registration record handed to [`WorkerRegistry::create_worker`].
pub struct WorkerDescriptor {
    pub name: String,
    pub worker: Box<dyn Worker>,
}

impl WorkerDescriptor {
    pub fn new(
        name: impl Into<String>,
        worker: Box<dyn Worker>,
    ) -> Self {
        Self {
            name: name.into(),
            worker,
        }
    }
}

impl Debug for WorkerDescriptor {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WorkerDescriptor").field("name", &self.name).finish()
    }
}

/// Keyed registry of background workers.
///
/// Registration and start are separate steps so a server can assemble its
/// worker set before running any of it.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait WorkerRegistry: Send + Sync + 'static {
    /// Registers a worker under its descriptor's name.
    fn create_worker(
        &self,
        descriptor: WorkerDescriptor,
    ) -> Result<()>;

    /// Spawns the registered worker's run loop.
    fn start_worker(
        &self,
        name: &str,
    ) -> Result<()>;

    /// Signals shutdown and waits for the worker's run loop to return.
    async fn stop_worker(
        &self,
        name: &str,
    ) -> Result<()>;

    /// Drops a stopped worker's registration.
    fn remove_worker(
        &self,
        name: &str,
    ) -> Result<()>;

    /// Nudges a sleeping worker by name.
    fn wakeup_worker(
        &self,
        name: &str,
    ) -> Result<()>;
}

//! # journal-replica
//!
//! Follower replication core for a Raft-style replicated journal server.
//!
//! This crate is the receiving half of log replication: it accepts ordered
//! batches of entries from a leader, enforces the log-matching invariant
//! against the local journal, truncates conflicting suffixes, advances the
//! commit point and installs replicated configuration changes. Everything
//! around it — elections, RPC transport, the state-machine applier, snapshot
//! transfer — belongs to the embedding server and is reached through traits.
//!
//! ## Architecture
//!
//! ```text
//! RPC layer ──submit()──▶ ingress queue ──▶ handler worker ──▶ journal
//!      ▲                 (priority order)        │
//!      └────── completion handle ◀──────────────┤
//!                                               └─ wakeup ──▶ applier
//! ```
//!
//! Requests are processed by a single background worker in
//! `(prev_log_term, prev_log_index)` order, which makes the worker the sole
//! journal writer on the follower path and removes any need for journal
//! locking here. Every submitted request is answered exactly once through
//! its completion handle: acceptance, protocol rejection, or error.
//!
//! ## Key traits
//!
//! - [`Journal`] — the append-only, index-addressed log being replicated
//! - [`WorkerRegistry`] — named background workers; the applier is woken by
//!   name when the commit point advances
//! - [`TypeConfig`] — binds a deployment's collaborator implementations
//!
//! ## Example
//!
//! ```rust,ignore
//! use journal_replica::{Follower, TypeConfig};
//!
//! #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
//! struct ServerTypes;
//! impl TypeConfig for ServerTypes {
//!     type J = MyJournal;          // your persistent journal
//!     type W = TokioWorkerRegistry;
//! }
//!
//! let follower = Follower::<ServerTypes>::new(
//!     journal, state, uri, term, reconciler, workers, snapshots, config,
//! );
//! follower.start()?;
//! let completion = follower.submit(request);
//! let response = completion.await;
//! ```

pub mod config;
mod errors;
mod follower;
mod membership;
mod messages;
mod replication;
mod storage;
mod type_config;
mod workers;

pub use crate::config::*;
pub use errors::*;
pub use follower::*;
pub use membership::*;
pub use messages::*;
pub use replication::*;
pub use storage::*;
pub use type_config::*;
pub use workers::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::*;

#[cfg(test)]
mod follower_test;

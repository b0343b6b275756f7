//! Message types exchanged between the leader and the follower replication
//! core.
//!
//! These are plain in-process types: the embedding server owns RPC framing
//! and the wire encoding. Everything here is serde-serialisable so a server
//! can pick whatever codec its transport uses.

use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;

/// Replacement of the cluster's voter set carried inside a replicated entry.
///
/// The entry records the set it replaces so an uncommitted change that gets
/// truncated can be rolled back without consulting any other state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChange {
    pub old_voters: Vec<String>,
    pub new_voters: Vec<String>,
}

/// Payload of a journal entry.
///
/// The follower treats command payloads as opaque bytes; only configuration
/// changes are interpreted, and only by the config reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryPayload {
    Command(Bytes),
    Config(ConfigChange),
}

/// A single journal entry: a term tag plus payload.
///
/// Entries carry no index of their own; the journal addresses them by
/// position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub term: u64,
    pub payload: EntryPayload,
}

impl Entry {
    pub fn command(
        term: u64,
        data: Bytes,
    ) -> Self {
        Self {
            term,
            payload: EntryPayload::Command(data),
        }
    }

    pub fn config(
        term: u64,
        change: ConfigChange,
    ) -> Self {
        Self {
            term,
            payload: EntryPayload::Config(change),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self.payload, EntryPayload::Config(_))
    }
}

/// Leader-to-follower message carrying a contiguous batch of entries and the
/// leader's commit point.
///
/// `prev_log_index` is signed: `-1` probes the position before the first
/// entry ever written, which is answered from the head snapshot's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendEntriesRequest {
    pub term: u64,
    pub leader: String,
    pub prev_log_index: i64,
    pub prev_log_term: u64,
    pub entries: Vec<Entry>,
    pub leader_commit: u64,
    /// The leader's journal tail, used by the surrounding server to judge
    /// how far this replica lags.
    pub max_index: u64,
}

impl AppendEntriesRequest {
    pub fn is_heartbeat(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Follower's answer to an append-entries request.
///
/// A rejection (`success == false`) is a normal protocol outcome telling the
/// leader to back its next-index pointer up; unexpected failures travel as
/// errors through the completion instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendEntriesResponse {
    pub success: bool,
    /// The index the leader should send next: `prev_log_index + 1`.
    pub journal_index: u64,
    pub term: u64,
    pub entry_count: usize,
}

impl AppendEntriesResponse {
    pub fn accepted(
        journal_index: u64,
        term: u64,
        entry_count: usize,
    ) -> Self {
        Self {
            success: true,
            journal_index,
            term,
            entry_count,
        }
    }

    pub fn rejected(
        journal_index: u64,
        term: u64,
        entry_count: usize,
    ) -> Self {
        Self {
            success: false,
            journal_index,
            term,
            entry_count,
        }
    }
}

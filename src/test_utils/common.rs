use crate::messages::AppendEntriesRequest;
use crate::messages::Entry;

/// Builds an append-entries request with the leader identity defaulted.
pub fn append_entries_request(
    term: u64,
    prev_log_index: i64,
    prev_log_term: u64,
    entries: Vec<Entry>,
    leader_commit: u64,
    max_index: u64,
) -> AppendEntriesRequest {
    AppendEntriesRequest {
        term,
        leader: "leader-1".to_string(),
        prev_log_index,
        prev_log_term,
        entries,
        leader_commit,
        max_index,
    }
}

/// An entry-less request: a heartbeat carrying only the leader's commit
/// point and tail.
pub fn heartbeat(
    term: u64,
    prev_log_index: i64,
    prev_log_term: u64,
    leader_commit: u64,
    max_index: u64,
) -> AppendEntriesRequest {
    append_entries_request(term, prev_log_index, prev_log_term, Vec::new(), leader_commit, max_index)
}

use std::cmp;

use parking_lot::RwLock;
use tracing::info;

use super::ConfigState;
use crate::MembershipError;
use crate::Result;
use crate::messages::Entry;
use crate::messages::EntryPayload;
use crate::storage::Journal;

/// Applies and rolls back replicated configuration changes on behalf of the
/// follower's handler loop.
///
/// The leader replicates at most one configuration change at a time, so the
/// uncommitted journal tail can hold at most one config entry and a single
/// rollback step is always enough.
#[derive(Debug, Default)]
pub struct ConfigReconciler;

impl ConfigReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Called before conflict resolution truncates the journal at
    /// `start_index` or above. If the uncommitted tail that may be dropped
    /// contains a configuration change, the live config state is reverted to
    /// that change's prior voter set.
    pub fn maybe_rollback_config<J>(
        &self,
        start_index: u64,
        journal: &J,
        config_state: &RwLock<ConfigState>,
    ) -> Result<()>
    where
        J: Journal + ?Sized,
    {
        let commit_index = journal.commit_index();
        let max_index = journal.max_index();
        let from = cmp::max(start_index, commit_index);
        if from >= max_index {
            return Ok(());
        }

        let tail = journal.entries_range(from..=max_index - 1)?;
        let mut pending = tail.iter().filter_map(|entry| match &entry.payload {
            EntryPayload::Config(change) => Some(change),
            EntryPayload::Command(_) => None,
        });

        let Some(change) = pending.next() else {
            return Ok(());
        };
        if pending.next().is_some() {
            return Err(MembershipError::MultiplePendingChanges.into());
        }

        info!(
            old_voters = ?change.old_voters,
            "rolling back uncommitted configuration change"
        );
        config_state.write().install_voters(change.old_voters.clone());
        Ok(())
    }

    /// Applies every configuration entry of a freshly replicated batch, in
    /// order. Non-leader roles install config changes on replication, not on
    /// commit.
    pub fn maybe_update_non_leader_config(
        &self,
        entries: &[Entry],
        config_state: &RwLock<ConfigState>,
    ) -> Result<()> {
        for entry in entries {
            if let EntryPayload::Config(change) = &entry.payload {
                info!(
                    new_voters = ?change.new_voters,
                    "applying replicated configuration change"
                );
                config_state.write().install_voters(change.new_voters.clone());
            }
        }
        Ok(())
    }
}

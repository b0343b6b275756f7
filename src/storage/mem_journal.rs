use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use tracing::trace;

use super::Journal;
use crate::Error;
use crate::JournalError;
use crate::Result;
use crate::messages::Entry;

/// In-memory journal implementation.
///
/// Entries live in an ordered map keyed by index; the live window and the
/// commit point are tracked in atomics so reads stay lock-free. All
/// mutations happen under the write lock, which keeps the observable
/// indices consistent with the map.
#[derive(Debug, Default)]
pub struct MemJournal {
    entries: RwLock<BTreeMap<u64, Entry>>,
    min_index: AtomicU64,
    max_index: AtomicU64,
    commit_index: AtomicU64,
}

impl MemJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every entry below `up_to`, simulating compaction of a prefix
    /// into a snapshot. The caller is responsible for only purging entries
    /// already covered by a snapshot.
    pub fn purge_up_to(
        &self,
        up_to: u64,
    ) -> Result<()> {
        let mut store = self.entries.write();
        let max = self.max_index.load(Ordering::SeqCst);
        if up_to > max {
            return Err(JournalError::IndexOverflow {
                index: up_to,
                max_index: max,
            }
            .into());
        }

        let purged: Vec<u64> = store.range(..up_to).map(|(index, _)| *index).collect();
        for index in purged {
            store.remove(&index);
        }
        self.min_index.fetch_max(up_to, Ordering::SeqCst);

        debug!(up_to, "purged journal prefix");
        Ok(())
    }
}

#[async_trait]
impl Journal for MemJournal {
    fn min_index(&self) -> u64 {
        self.min_index.load(Ordering::SeqCst)
    }

    fn max_index(&self) -> u64 {
        self.max_index.load(Ordering::SeqCst)
    }

    fn commit_index(&self) -> u64 {
        self.commit_index.load(Ordering::SeqCst)
    }

    fn term_at(
        &self,
        index: u64,
    ) -> Result<u64> {
        let store = self.entries.read();
        let min = self.min_index.load(Ordering::SeqCst);
        let max = self.max_index.load(Ordering::SeqCst);
        if index < min {
            return Err(JournalError::IndexUnderflow {
                index: index as i64,
                min_index: min,
            }
            .into());
        }
        if index >= max {
            return Err(JournalError::IndexOverflow {
                index,
                max_index: max,
            }
            .into());
        }
        store.get(&index).map(|entry| entry.term).ok_or_else(|| {
            Error::Fatal(format!(
                "journal entry {index} missing inside live range [{min}, {max})"
            ))
        })
    }

    fn entries_range(
        &self,
        range: RangeInclusive<u64>,
    ) -> Result<Vec<Entry>> {
        let store = self.entries.read();
        Ok(store.range(range).map(|(_, entry)| entry.clone()).collect())
    }

    async fn compare_or_append(
        &self,
        entries: Vec<Entry>,
        start_index: u64,
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut store = self.entries.write();
        let min = self.min_index.load(Ordering::SeqCst);
        let max = self.max_index.load(Ordering::SeqCst);
        let commit = self.commit_index.load(Ordering::SeqCst);

        if start_index < min {
            return Err(JournalError::IndexUnderflow {
                index: start_index as i64,
                min_index: min,
            }
            .into());
        }
        // A gap between the current tail and the batch would leave
        // unaddressable holes.
        if start_index > max {
            return Err(JournalError::IndexOverflow {
                index: start_index,
                max_index: max,
            }
            .into());
        }

        // Find the first position where the batch and the journal disagree
        // before touching anything, so a forbidden truncation leaves the
        // journal unmodified.
        let mut divergence = None;
        for (offset, entry) in entries.iter().enumerate() {
            let index = start_index + offset as u64;
            if index >= max {
                divergence = Some((offset, index));
                break;
            }
            let existing_term = store.get(&index).map(|existing| existing.term);
            if existing_term != Some(entry.term) {
                if index < commit {
                    return Err(JournalError::TruncateCommitted {
                        index,
                        commit_index: commit,
                    }
                    .into());
                }
                divergence = Some((offset, index));
                break;
            }
        }

        let Some((offset, index)) = divergence else {
            trace!(start_index, count = entries.len(), "batch already in journal");
            return Ok(());
        };

        if index < max {
            let stale: Vec<u64> = store.range(index..).map(|(stale, _)| *stale).collect();
            for stale_index in stale {
                store.remove(&stale_index);
            }
            debug!(from = index, old_max = max, "truncated conflicting suffix");
        }

        let mut next = index;
        for entry in entries.into_iter().skip(offset) {
            store.insert(next, entry);
            next += 1;
        }
        self.max_index.store(next, Ordering::SeqCst);

        trace!(start_index, new_max = next, "appended entries");
        Ok(())
    }

    async fn commit(
        &self,
        up_to: u64,
    ) -> Result<()> {
        let max = self.max_index.load(Ordering::SeqCst);
        if up_to > max {
            return Err(JournalError::CommitBeyondMax {
                index: up_to,
                max_index: max,
            }
            .into());
        }
        self.commit_index.fetch_max(up_to, Ordering::SeqCst);
        Ok(())
    }
}

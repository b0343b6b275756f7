use bytes::Bytes;

use crate::messages::ConfigChange;
use crate::messages::Entry;

/// Fluent builder for batches of journal entries.
pub struct EntryBuilder {
    term: u64,
    entries: Vec<Entry>,
}

impl EntryBuilder {
    pub fn new(term: u64) -> Self {
        Self {
            term,
            entries: Vec::new(),
        }
    }

    /// Entries added after this call carry `term`.
    pub fn term(
        mut self,
        term: u64,
    ) -> Self {
        self.term = term;
        self
    }

    pub fn command(
        mut self,
        data: &[u8],
    ) -> Self {
        self.entries.push(Entry::command(self.term, Bytes::from(data.to_vec())));
        self
    }

    pub fn config(
        mut self,
        old_voters: &[&str],
        new_voters: &[&str],
    ) -> Self {
        self.entries.push(Entry::config(self.term, ConfigChange {
            old_voters: old_voters.iter().map(|voter| voter.to_string()).collect(),
            new_voters: new_voters.iter().map(|voter| voter.to_string()).collect(),
        }));
        self
    }

    pub fn build(self) -> Vec<Entry> {
        self.entries
    }
}

/// `count` command entries all tagged with `term`.
pub fn commands(
    term: u64,
    count: usize,
) -> Vec<Entry> {
    (0..count).fold(EntryBuilder::new(term), |builder, i| {
        builder.command(format!("cmd-{i}").as_bytes())
    })
    .build()
}

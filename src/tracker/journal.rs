//! Per-document history of recent edit batches.

use std::collections::VecDeque;

use crate::cells::{map_line, LineEdit};

/// Revision counter plus a bounded window of the edit batches that produced
/// the most recent revisions.
#[derive(Debug, Clone)]
pub(crate) struct EditJournal {
    revision: u64,
    batches: VecDeque<(u64, Vec<LineEdit>)>,
    limit: usize,
}

impl EditJournal {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            revision: 0,
            batches: VecDeque::new(),
            limit,
        }
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    /// Record a batch and return the revision it produced.
    pub(crate) fn record(&mut self, edits: Vec<LineEdit>) -> u64 {
        self.revision += 1;
        if self.limit > 0 {
            self.batches.push_back((self.revision, edits));
            while self.batches.len() > self.limit {
                self.batches.pop_front();
            }
        }
        self.revision
    }

    /// Map a line observed at revision `since` into current coordinates.
    ///
    /// Returns `None` when `since` is newer than the journal or older than
    /// the oldest batch still kept.
    pub(crate) fn map_line(&self, line: usize, since: u64) -> Option<usize> {
        if since > self.revision {
            return None;
        }
        if since == self.revision {
            return Some(line);
        }
        let oldest = self.batches.front().map(|(rev, _)| *rev)?;
        if oldest > since + 1 {
            return None;
        }
        let edits = self
            .batches
            .iter()
            .filter(|(rev, _)| *rev > since)
            .flat_map(|(_, edits)| edits.iter());
        Some(map_line(line, edits))
    }
}

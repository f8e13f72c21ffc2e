//! Live tracking of executed cells through document edits.
//!
//! `CellTracker` is the single owner of all tracked state. It receives these
//! events, one at a time:
//! - a fragment submitted to the execution engine (`submit`)
//! - a batch of edits applied to a document (`document_edited`)
//! - a document closed in the editor (`document_closed`)
//! - an engine restart (`reset_all`)
//!
//! and answers `snapshot()` with the current location of every live block.

mod journal;
mod source;
mod state;

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cells::{locate, virtual_match, CellSplitter, LineEdit, NewlineStyle};

pub use source::DocumentSource;

use state::DocumentBlocks;

/// Default number of edit batches remembered per document.
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

/// Runtime configuration of a tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// When false every event is ignored and snapshots are empty.
    pub enabled: bool,
    pub splitter: CellSplitter,
    /// Fixed newline style, or `None` to detect it per document.
    pub newline: Option<NewlineStyle>,
    /// Edit batches kept for mapping hint lines from older revisions.
    pub history_limit: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            splitter: CellSplitter::default(),
            newline: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl TrackerConfig {
    fn newline_for(&self, text: &str) -> NewlineStyle {
        self.newline.unwrap_or_else(|| NewlineStyle::detect(text))
    }
}

/// A fragment sent to the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Exact text that was executed.
    pub code: String,
    /// Document key the text came from.
    pub file: String,
    /// Approximate 0-based line of the fragment's first line.
    pub line: usize,
    /// Document revision at which `line` was observed, if known.
    #[serde(default)]
    pub revision: Option<u64>,
}

impl Submission {
    pub fn new(code: impl Into<String>, file: impl Into<String>, line: usize) -> Self {
        Self {
            code: code.into(),
            file: file.into(),
            line,
            revision: None,
        }
    }

    pub fn at_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }
}

/// Inbound events, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    Submit(Submission),
    DocumentEdited { file: String, edits: Vec<LineEdit> },
    DocumentClosed { file: String },
    Reset,
}

/// Location of one live block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSnapshot {
    pub start_line: usize,
    /// First line after the block.
    pub end_line: usize,
    pub execution_count: u32,
}

/// Live blocks of one document, ordered by start line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSnapshot {
    pub file: String,
    pub blocks: Vec<BlockSnapshot>,
}

/// Owner of all tracked document state.
pub struct CellTracker<S> {
    source: S,
    config: TrackerConfig,
    documents: BTreeMap<String, DocumentBlocks>,
}

impl<S: DocumentSource> CellTracker<S> {
    pub fn new(source: S, config: TrackerConfig) -> Self {
        Self {
            source,
            config,
            documents: BTreeMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Turn tracking on or off. Turning it off drops all tracked state,
    /// since edits made while disabled are never seen.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.documents.clear();
        }
        self.config.enabled = enabled;
    }

    /// Replace the configuration, keeping tracked blocks unless the new
    /// configuration disables tracking.
    pub fn reconfigure(&mut self, config: TrackerConfig) {
        let enabled = config.enabled;
        self.config = config;
        self.set_enabled(enabled);
    }

    /// Dispatch an event to its entry point.
    pub fn handle(&mut self, event: TrackerEvent) {
        match event {
            TrackerEvent::Submit(submission) => self.submit(submission),
            TrackerEvent::DocumentEdited { file, edits } => self.document_edited(&file, &edits),
            TrackerEvent::DocumentClosed { file } => self.document_closed(&file),
            TrackerEvent::Reset => self.reset_all(),
        }
    }

    /// Record a submission whose line is in current coordinates.
    pub fn submit_fragment(&mut self, code: &str, file: &str, approx_line: usize) {
        self.submit(Submission::new(code, file, approx_line));
    }

    /// Record a submission, creating or refreshing the block for its code.
    pub fn submit(&mut self, submission: Submission) {
        if !self.is_enabled() {
            return;
        }
        let Submission {
            code,
            file,
            line,
            revision,
        } = submission;

        let history_limit = self.config.history_limit;
        let doc = self
            .documents
            .entry(file.clone())
            .or_insert_with(|| DocumentBlocks::new(history_limit));

        let hint = match revision {
            Some(rev) => doc.journal.map_line(line, rev).unwrap_or_else(|| {
                debug!(
                    "revision {} of {} is outside the edit history, using line {} as-is",
                    rev, file, line
                );
                line
            }),
            None => line,
        };

        let found = match self.source.text(&file) {
            Some(text) => locate(
                &self.config.splitter,
                &text,
                self.config.newline_for(&text),
                &code,
                hint,
            ),
            None => virtual_match(&code, hint),
        };
        let found = match (found.is_virtual(), self.source.line_count(&file)) {
            // Keep degraded placements inside the document when its size is known.
            (true, Some(count)) if hint >= count && count > 0 => {
                virtual_match(&code, count - 1)
            }
            _ => found,
        };

        let execution_count = doc.place(&code, found);
        debug!(
            "{} block in {} at {:?}, execution count {}",
            if found.is_virtual() { "virtual" } else { "cell" },
            file,
            found.range(),
            execution_count
        );
    }

    /// Apply an ordered batch of edits made to `file`.
    pub fn document_edited(&mut self, file: &str, edits: &[LineEdit]) {
        if !self.is_enabled() || edits.is_empty() {
            return;
        }

        let history_limit = self.config.history_limit;
        let doc = self
            .documents
            .entry(file.to_string())
            .or_insert_with(|| DocumentBlocks::new(history_limit));
        let revision = doc.journal.record(edits.to_vec());

        if doc.blocks().is_empty() {
            return;
        }

        let invalidated = doc.translate(edits);
        if invalidated > 0 {
            debug!("{} block(s) in {} invalidated at revision {}", invalidated, file, revision);
        }

        if doc.has_deleted() {
            match self.source.text(file) {
                Some(text) => {
                    let newline = self.config.newline_for(&text);
                    let revived = doc.revive(&self.config.splitter, &text, newline);
                    if revived > 0 {
                        debug!("{} block(s) in {} revived at revision {}", revived, file, revision);
                    }
                }
                None => debug!("no text for {}, skipping revival", file),
            }
        }
    }

    /// Drop everything tracked for `file`. Edits made while a document is
    /// closed are never seen, so its blocks cannot be kept in place.
    pub fn document_closed(&mut self, file: &str) {
        if self.documents.remove(file).is_some() {
            debug!("dropped tracked state of closed document {}", file);
        }
    }

    /// Forget everything, e.g. after the execution engine restarted.
    pub fn reset_all(&mut self) {
        debug!("resetting {} tracked document(s)", self.documents.len());
        self.documents.clear();
    }

    /// Current edit revision of `file`; 0 before any edit was seen.
    pub fn revision(&self, file: &str) -> u64 {
        self.documents
            .get(file)
            .map(|doc| doc.journal.revision())
            .unwrap_or(0)
    }

    /// Live blocks grouped by document. Documents without live blocks are
    /// left out.
    pub fn snapshot(&self) -> Vec<DocumentSnapshot> {
        if !self.is_enabled() {
            return Vec::new();
        }
        self.documents
            .iter()
            .filter_map(|(file, doc)| {
                let blocks: Vec<BlockSnapshot> = doc
                    .live()
                    .map(|b| BlockSnapshot {
                        start_line: b.range.start,
                        end_line: b.range.end,
                        execution_count: b.execution_count,
                    })
                    .collect();
                (!blocks.is_empty()).then(|| DocumentSnapshot {
                    file: file.clone(),
                    blocks,
                })
            })
            .collect()
    }
}

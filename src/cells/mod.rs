//! Cell parsing and line-range bookkeeping.
//!
//! This module provides:
//! - `CellSplitter` for breaking a document into delimiter-separated cells
//! - `locate` for finding the cell a submitted fragment came from
//! - `apply_edit` / `translate_batch` for moving line ranges through edits
//! - `find_revival` / `revive_in_place` for re-anchoring a block whose text
//!   reappeared

mod matcher;
mod revival;
mod splitter;
mod translate;

pub use matcher::{locate, matching_cells, virtual_match, FragmentMatch};
pub use revival::{find_revival, revive_in_place};
pub use splitter::{Cell, CellMarkers, CellSplitter, Cells, NewlineStyle};
pub use translate::{apply_edit, map_line, translate_batch, EditImpact, LineEdit, Translated};

/// Half-open range of 0-based line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Whether the two ranges share at least one line.
    pub fn overlaps(&self, other: &LineRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Split a fragment into the lines used for identity comparisons.
///
/// `\n` and `\r\n` both terminate a line and a trailing terminator does not
/// start a new one. An empty fragment still counts as one (empty) line.
pub(crate) fn fragment_lines(code: &str) -> Vec<&str> {
    let lines: Vec<&str> = code.lines().collect();
    if lines.is_empty() {
        vec![""]
    } else {
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_half_open() {
        let a = LineRange::new(2, 4);
        assert!(a.overlaps(&LineRange::new(3, 5)));
        assert!(a.overlaps(&LineRange::new(0, 3)));
        assert!(!a.overlaps(&LineRange::new(4, 6)));
        assert!(!a.overlaps(&LineRange::new(0, 2)));
    }

    #[test]
    fn fragment_lines_ignore_newline_style() {
        assert_eq!(fragment_lines("#%%\r\nx = 1\r\n"), vec!["#%%", "x = 1"]);
        assert_eq!(fragment_lines("#%%\nx = 1"), vec!["#%%", "x = 1"]);
        assert_eq!(fragment_lines(""), vec![""]);
    }
}

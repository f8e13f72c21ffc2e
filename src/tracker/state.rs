//! Tracked blocks and the per-document state that owns them.

use std::collections::HashMap;

use crate::cells::{
    find_revival, fragment_lines, matching_cells, revive_in_place, translate_batch, CellSplitter,
    FragmentMatch, LineEdit, LineRange, NewlineStyle,
};

use super::journal::EditJournal;

/// Live record of one submitted fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrackedBlock {
    /// Exact submitted text. Never changes after creation.
    pub code: String,
    /// Current half-open line range in the live document.
    pub range: LineRange,
    /// Number of times this exact text has been submitted.
    pub execution_count: u32,
    /// Set while an edit has damaged the block's text.
    pub deleted: bool,
    /// The code matched no cell when it was submitted.
    pub is_virtual: bool,
}

/// Everything tracked for one document.
#[derive(Debug, Clone)]
pub(crate) struct DocumentBlocks {
    /// Sorted by range start.
    blocks: Vec<TrackedBlock>,
    /// Execution counts keyed by exact code text.
    counts: HashMap<String, u32>,
    pub(crate) journal: EditJournal,
}

impl DocumentBlocks {
    pub(crate) fn new(history_limit: usize) -> Self {
        Self {
            blocks: Vec::new(),
            counts: HashMap::new(),
            journal: EditJournal::new(history_limit),
        }
    }

    pub(crate) fn blocks(&self) -> &[TrackedBlock] {
        &self.blocks
    }

    pub(crate) fn live(&self) -> impl Iterator<Item = &TrackedBlock> {
        self.blocks.iter().filter(|b| !b.deleted)
    }

    pub(crate) fn has_deleted(&self) -> bool {
        self.blocks.iter().any(|b| b.deleted)
    }

    /// Record a submission of `code` where it was found and return its new
    /// count.
    ///
    /// The block for `code` (if any) and every block overlapping the found
    /// range are replaced by the new placement.
    pub(crate) fn place(&mut self, code: &str, found: FragmentMatch) -> u32 {
        let range = found.range();
        let count = self.counts.entry(code.to_string()).or_insert(0);
        *count += 1;
        let execution_count = *count;

        self.blocks.retain(|b| b.code != code && !b.range.overlaps(&range));
        self.blocks.push(TrackedBlock {
            code: code.to_string(),
            range,
            execution_count,
            deleted: false,
            is_virtual: found.is_virtual(),
        });
        self.sort();
        execution_count
    }

    /// Move every block through an edit batch. Blocks whose text the batch
    /// touched are marked deleted. Returns how many were newly invalidated.
    pub(crate) fn translate(&mut self, edits: &[LineEdit]) -> usize {
        let ranges: Vec<LineRange> = self.blocks.iter().map(|b| b.range).collect();
        let mut invalidated = 0;
        for (block, translated) in self.blocks.iter_mut().zip(translate_batch(&ranges, edits)) {
            block.range = translated.range;
            if translated.overlapped() && !block.deleted {
                block.deleted = true;
                invalidated += 1;
            }
        }
        invalidated
    }

    /// Try to revive every deleted block against the current text.
    /// Returns how many came back.
    ///
    /// A cell block returns only onto a whole cell equal to its code that
    /// overlaps its translated range. A virtual block returns only when its
    /// lines are back exactly at its translated start.
    pub(crate) fn revive(
        &mut self,
        splitter: &CellSplitter,
        text: &str,
        newline: NewlineStyle,
    ) -> usize {
        let lines: Vec<&str> = text.lines().collect();
        let mut revived = 0;

        for i in 0..self.blocks.len() {
            if !self.blocks[i].deleted {
                continue;
            }
            let occupied: Vec<LineRange> = self.live().map(|b| b.range).collect();
            let block = &mut self.blocks[i];
            let found = if block.is_virtual {
                let code = fragment_lines(&block.code);
                revive_in_place(&lines, &code, block.range.start, &occupied)
            } else {
                let matches = matching_cells(splitter, text, newline, &block.code);
                find_revival(matches, block.range, &occupied)
            };
            if let Some(range) = found {
                block.range = range;
                block.deleted = false;
                revived += 1;
            }
        }

        self.sort();
        revived
    }

    fn sort(&mut self) {
        self.blocks.sort_by_key(|b| (b.range.start, b.range.end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(start: usize, end: usize) -> FragmentMatch {
        FragmentMatch::Cell(LineRange::new(start, end))
    }

    fn revive(doc: &mut DocumentBlocks, text: &str) -> usize {
        doc.revive(&CellSplitter::default(), text, NewlineStyle::Lf)
    }

    fn live(doc: &DocumentBlocks) -> Vec<LineRange> {
        doc.live().map(|b| b.range).collect()
    }

    #[test]
    fn identical_code_refreshes_one_block() {
        let mut doc = DocumentBlocks::new(4);
        assert_eq!(doc.place("#%%\nx", cell(0, 2)), 1);
        assert_eq!(doc.place("#%%\nx", cell(4, 6)), 2);
        assert_eq!(doc.blocks().len(), 1);
        assert_eq!(doc.blocks()[0].range, LineRange::new(4, 6));
    }

    #[test]
    fn overlapping_placement_evicts_other_code() {
        let mut doc = DocumentBlocks::new(4);
        doc.place("#%%\nx", cell(0, 2));
        doc.place("#%%\ny", cell(4, 6));
        doc.place("#%%\nx\ny", cell(0, 3));
        let codes: Vec<&str> = doc.blocks().iter().map(|b| b.code.as_str()).collect();
        assert_eq!(codes, vec!["#%%\nx\ny", "#%%\ny"]);
    }

    #[test]
    fn counts_survive_eviction() {
        let mut doc = DocumentBlocks::new(4);
        doc.place("one", cell(0, 1));
        doc.place("two", cell(0, 1));
        assert_eq!(doc.place("one", cell(0, 1)), 2);
    }

    #[test]
    fn translate_then_revive() {
        let mut doc = DocumentBlocks::new(4);
        doc.place("#%%\nb", cell(2, 4));

        assert_eq!(doc.translate(&[LineEdit::insert(2, 3, "#")]), 1);
        assert_eq!(revive(&mut doc, "#%%\na\n#%%#\nb"), 0);
        assert!(live(&doc).is_empty());

        assert_eq!(doc.translate(&[LineEdit::replace((2, 3), (2, 4), "")]), 0);
        assert_eq!(revive(&mut doc, "#%%\na\n#%%\nb"), 1);
        assert_eq!(live(&doc), vec![LineRange::new(2, 4)]);
    }

    #[test]
    fn damaged_block_does_not_move_to_identical_neighbour() {
        let mut doc = DocumentBlocks::new(4);
        doc.place("#%%\nx", cell(2, 4));

        doc.translate(&[LineEdit::replace((3, 0), (3, 1), "y")]);
        assert_eq!(revive(&mut doc, "#%%\nx\n#%%\ny\n"), 0);
        assert!(live(&doc).is_empty());
    }

    #[test]
    fn grown_cell_stays_deleted_until_it_matches_again() {
        let mut doc = DocumentBlocks::new(4);
        doc.place("#%%\nx", cell(2, 4));

        doc.translate(&[LineEdit::insert(3, 1, "\ny = 2")]);
        assert_eq!(revive(&mut doc, "#%%\na\n#%%\nx\ny = 2\n"), 0);

        doc.translate(&[LineEdit::replace((3, 1), (4, 5), "")]);
        assert_eq!(revive(&mut doc, "#%%\na\n#%%\nx\n"), 1);
        assert_eq!(live(&doc), vec![LineRange::new(2, 4)]);
    }

    #[test]
    fn virtual_block_revives_only_in_place() {
        let mut doc = DocumentBlocks::new(4);
        doc.place("x = 1", FragmentMatch::Virtual(LineRange::new(1, 2)));

        doc.translate(&[LineEdit::replace((1, 4), (1, 5), "2")]);
        assert_eq!(revive(&mut doc, "#%%\nx = 2\nx = 1\n"), 0);

        doc.translate(&[LineEdit::replace((1, 4), (1, 5), "1")]);
        assert_eq!(revive(&mut doc, "#%%\nx = 1\nx = 1\n"), 1);
        assert_eq!(live(&doc), vec![LineRange::new(1, 2)]);
    }
}

//! Text utilities for applying editor changes.
//!
//! `didChange` ranges are expressed in LSP positions (line plus UTF-16
//! column). `LineIndex` turns them into byte offsets so a change can be
//! spliced into the stored text.

use tower_lsp::lsp_types::{Position, Range};

/// Pre-computed line index for one version of a document.
///
/// Line starts are computed once, so each position lookup is a table access
/// plus a scan of a single line for its UTF-16 column.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset where each line starts.
    line_starts: Vec<usize>,
    /// Source text (needed for UTF-16 column calculation).
    source: String,
}

impl LineIndex {
    /// Build a line index from source text.
    pub fn new(source: String) -> Self {
        let mut line_starts = vec![0];

        for (i, c) in source.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }

        Self {
            line_starts,
            source,
        }
    }

    /// Byte range of a line's content, without its line break.
    fn line_bounds(&self, line: usize) -> Option<(usize, usize)> {
        let start = *self.line_starts.get(line)?;
        let end = match self.line_starts.get(line + 1) {
            Some(&next) => {
                // Exclude "\n" and, for CRLF documents, the "\r" before it
                let content = &self.source[start..next - 1];
                start + content.strip_suffix('\r').unwrap_or(content).len()
            }
            None => self.source.len(),
        };
        Some((start, end))
    }

    /// Convert an LSP position to a byte offset.
    ///
    /// Returns None if the line is out of bounds. Columns past the end of a
    /// line resolve to the end of that line's content.
    pub fn position_to_offset(&self, position: Position) -> Option<usize> {
        let (line_start, line_end) = self.line_bounds(position.line as usize)?;

        // Walk UTF-16 code units to find byte offset
        let mut utf16_col = 0u32;
        for (i, c) in self.source[line_start..line_end].char_indices() {
            if utf16_col >= position.character {
                return Some(line_start + i);
            }
            utf16_col += c.len_utf16() as u32;
        }

        // Position is at or past end of line
        Some(line_end)
    }

    /// Position just past the last character of the text.
    pub fn end_position(&self) -> Position {
        let line = self.line_starts.len() - 1;
        let last = &self.source[self.line_starts[line]..];
        Position::new(line as u32, last.encode_utf16().count() as u32)
    }

    /// Replace `range` with `text`, consuming the index.
    ///
    /// Out-of-range positions are clamped to the end of the text, and an
    /// inverted range becomes an insertion at its start.
    pub fn splice(self, range: Range, text: &str) -> String {
        let len = self.source.len();
        let start = self.position_to_offset(range.start).unwrap_or(len);
        let end = self.position_to_offset(range.end).unwrap_or(len).max(start);

        let mut source = self.source;
        source.replace_range(start..end, text);
        source
    }
}

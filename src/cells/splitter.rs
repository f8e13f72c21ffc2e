//! Cell splitting for delimiter-based notebook documents.
//!
//! A document is divided into cells by delimiter lines such as `# %%`.
//! Each cell starts at its delimiter and runs until the line before the next
//! delimiter (or the end of the document). Text before the first delimiter
//! forms an implicit leading cell.

use std::iter::{Enumerate, Peekable};
use std::str::Lines;
use std::sync::LazyLock;

use regex::Regex;

/// Marker patterns recognised when no settings override them.
pub const DEFAULT_CELL_MARKERS: &[&str] = &[
    r"^\s*#\s*%%",
    r"^\s*#\s*<codecell>",
    r"^\s*#\s*In\[\d*\]",
    r"^\s*#\s*In\[ \]",
];

static DEFAULT_MARKER_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DEFAULT_CELL_MARKERS
        .iter()
        .map(|pattern| Regex::new(pattern).unwrap())
        .collect()
});

/// Line terminator used when reassembling cell text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NewlineStyle {
    #[default]
    Lf,
    CrLf,
}

impl NewlineStyle {
    /// Guess the style of a document: any `\r\n` makes it CRLF.
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            NewlineStyle::CrLf
        } else {
            NewlineStyle::Lf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NewlineStyle::Lf => "\n",
            NewlineStyle::CrLf => "\r\n",
        }
    }
}

/// Compiled set of delimiter-line patterns.
#[derive(Debug, Clone)]
pub struct CellMarkers {
    patterns: Vec<Regex>,
}

impl Default for CellMarkers {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_MARKER_REGEXES.clone(),
        }
    }
}

impl CellMarkers {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    /// Check whether a single line (without terminator) starts a new cell.
    pub fn is_delimiter(&self, line: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(line))
    }
}

/// A delimiter-bounded block of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Index of the cell's first line (its delimiter, unless implicit).
    pub first_line: usize,
    /// Index of the cell's last line, inclusive.
    pub last_line: usize,
    /// The cell's lines joined with the document's newline style.
    pub text: String,
}

/// Splits documents into cells using a set of markers.
#[derive(Debug, Clone, Default)]
pub struct CellSplitter {
    markers: CellMarkers,
}

impl CellSplitter {
    pub fn new(markers: CellMarkers) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &CellMarkers {
        &self.markers
    }

    /// Lazily split `text` into cells.
    ///
    /// The returned iterator is `Clone`, so a sequence can be restarted from
    /// any point without re-reading the document.
    pub fn split<'a>(&'a self, text: &'a str, newline: NewlineStyle) -> Cells<'a> {
        // Blank documents have no cells at all, not one whitespace cell.
        let source = if text.trim().is_empty() { "" } else { text };
        Cells {
            markers: &self.markers,
            lines: source.lines().enumerate().peekable(),
            newline,
        }
    }
}

/// Iterator over the cells of one document.
#[derive(Debug, Clone)]
pub struct Cells<'a> {
    markers: &'a CellMarkers,
    lines: Peekable<Enumerate<Lines<'a>>>,
    newline: NewlineStyle,
}

impl Iterator for Cells<'_> {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        let (first_line, first_text) = self.lines.next()?;
        let mut body = vec![first_text];
        let mut last_line = first_line;

        while let Some(&(index, line)) = self.lines.peek() {
            if self.markers.is_delimiter(line) {
                break;
            }
            body.push(line);
            last_line = index;
            self.lines.next();
        }

        Some(Cell {
            first_line,
            last_line,
            text: body.join(self.newline.as_str()),
        })
    }
}

//! Locating the cell a submitted fragment came from.

use super::splitter::{CellSplitter, NewlineStyle};
use super::{fragment_lines, LineRange};

/// Where a fragment was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentMatch {
    /// A cell in the current text holds exactly the fragment.
    Cell(LineRange),
    /// No cell matched; the range is derived from the hint and the
    /// fragment's own line count.
    Virtual(LineRange),
}

impl FragmentMatch {
    pub fn range(&self) -> LineRange {
        match self {
            FragmentMatch::Cell(range) | FragmentMatch::Virtual(range) => *range,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, FragmentMatch::Virtual(_))
    }
}

/// Virtual placement for a fragment that is not (or no longer) in the text.
pub fn virtual_match(code: &str, hint: usize) -> FragmentMatch {
    let height = fragment_lines(code).len();
    FragmentMatch::Virtual(LineRange::new(hint, hint + height))
}

/// Ranges of the cells in `text` whose lines equal `code`.
pub fn matching_cells<'a>(
    splitter: &'a CellSplitter,
    text: &'a str,
    newline: NewlineStyle,
    code: &'a str,
) -> impl Iterator<Item = LineRange> + 'a {
    let wanted = fragment_lines(code);
    splitter
        .split(text, newline)
        .filter(move |cell| cell.text.lines().eq(wanted.iter().copied()))
        .map(|cell| LineRange::new(cell.first_line, cell.last_line + 1))
}

/// Find the cell in `text` whose lines equal `code`.
///
/// Among several identical cells the one starting closest at or after
/// `hint` wins; when every match starts before `hint`, the nearest one is
/// used. This is a heuristic for duplicate cells, not a guarantee.
pub fn locate(
    splitter: &CellSplitter,
    text: &str,
    newline: NewlineStyle,
    code: &str,
    hint: usize,
) -> FragmentMatch {
    let best = matching_cells(splitter, text, newline, code).fold(None, |best: Option<LineRange>, candidate| {
        match best {
            Some(current) if !is_closer(candidate.start, current.start, hint) => Some(current),
            _ => Some(candidate),
        }
    });

    match best {
        Some(range) => FragmentMatch::Cell(range),
        None => virtual_match(code, hint),
    }
}

/// Ordering for candidate starts: at-or-after the hint beats before it,
/// then smaller distance wins.
fn is_closer(candidate: usize, current: usize, hint: usize) -> bool {
    let key = |start: usize| {
        if start >= hint {
            (0, start - hint)
        } else {
            (1, hint - start)
        }
    };
    key(candidate) < key(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(text: &str, code: &str, hint: usize) -> FragmentMatch {
        locate(
            &CellSplitter::default(),
            text,
            NewlineStyle::detect(text),
            code,
            hint,
        )
    }

    #[test]
    fn matches_second_cell() {
        let text = "#%%\r\nprint(\"foo\")\r\n#%%\r\nprint(\"bar\")";
        let got = find(text, "#%%\r\nprint(\"bar\")", 2);
        assert_eq!(got, FragmentMatch::Cell(LineRange::new(2, 4)));
    }

    #[test]
    fn newline_style_does_not_matter() {
        let text = "#%%\r\nprint(\"foo\")\r\n#%%\r\nprint(\"bar\")\r\n";
        let got = find(text, "#%%\nprint(\"bar\")\n", 0);
        assert_eq!(got, FragmentMatch::Cell(LineRange::new(2, 4)));
    }

    #[test]
    fn whitespace_matters() {
        let text = "#%%\nx = 1\n#%%\ny = 2";
        let got = find(text, "#%%\nx = 1 ", 0);
        assert!(got.is_virtual());
    }

    #[test]
    fn duplicate_cells_prefer_at_or_after_hint() {
        let text = "#%%\nx\n#%%\ny\n#%%\nx\n#%%\nx";
        assert_eq!(find(text, "#%%\nx", 0).range(), LineRange::new(0, 2));
        assert_eq!(find(text, "#%%\nx", 1).range(), LineRange::new(4, 6));
        assert_eq!(find(text, "#%%\nx", 5).range(), LineRange::new(6, 8));
    }

    #[test]
    fn duplicate_cells_fall_back_to_nearest_before_hint() {
        let text = "#%%\nx\n#%%\nx\n#%%\ny";
        assert_eq!(find(text, "#%%\nx", 5).range(), LineRange::new(2, 4));
    }

    #[test]
    fn unmatched_fragment_is_virtual() {
        let got = find("#%%\na\n", "x = 1\ny = 2\nz = 3", 7);
        assert_eq!(got, FragmentMatch::Virtual(LineRange::new(7, 10)));
    }

    #[test]
    fn empty_fragment_spans_one_line() {
        let got = find("#%%\na\n", "", 3);
        assert_eq!(got, FragmentMatch::Virtual(LineRange::new(3, 4)));
    }

    #[test]
    fn implicit_leading_cell_matches() {
        let text = "import os\n#%%\nx = 1";
        assert_eq!(
            find(text, "import os", 0),
            FragmentMatch::Cell(LineRange::new(0, 1))
        );
    }
}

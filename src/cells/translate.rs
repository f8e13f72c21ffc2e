//! Line-range translation through text edits.
//!
//! Edits are expressed the way editors report them: a replaced range in the
//! coordinates of the document just before the edit, plus the inserted text.
//! Every function here is pure, so the bookkeeping can be tested with
//! synthetic edit lists and no document at all.

use tower_lsp::lsp_types::{Position, Range};

use super::LineRange;

/// One text replacement in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEdit {
    /// Replaced range, valid in the document as it was before this edit.
    pub range: Range,
    /// Text inserted in place of `range`.
    pub text: String,
}

impl LineEdit {
    pub fn new(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// Pure insertion of `text` at a position.
    pub fn insert(line: u32, character: u32, text: impl Into<String>) -> Self {
        let at = Position::new(line, character);
        Self::new(Range::new(at, at), text)
    }

    /// Replacement of `[start, end)` with `text`.
    pub fn replace(start: (u32, u32), end: (u32, u32), text: impl Into<String>) -> Self {
        Self::new(
            Range::new(Position::new(start.0, start.1), Position::new(end.0, end.1)),
            text,
        )
    }

    /// Net change in the number of lines caused by this edit.
    pub fn line_delta(&self) -> isize {
        let inserted = self.text.matches('\n').count() as isize;
        let removed = self.range.end.line as isize - self.range.start.line as isize;
        inserted - removed
    }

    fn start_line(&self) -> usize {
        self.range.start.line as usize
    }

    fn end_line(&self) -> usize {
        self.range.end.line as usize
    }

    /// Whether the edit finishes before `line` begins and leaves that line
    /// starting at column 0.
    fn ends_before_line(&self, line: usize) -> bool {
        let end = self.range.end;
        if self.end_line() < line {
            return true;
        }
        if self.end_line() > line || end.character != 0 {
            return false;
        }
        // The edit stops right at the line's first character. The line is
        // untouched only if whatever now precedes it is a line break.
        self.text.ends_with('\n') || (self.text.is_empty() && self.range.start.character == 0)
    }
}

/// How an edit related to a tracked range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditImpact {
    /// The edit happened after the range.
    Untouched,
    /// The edit happened before the range; the range moved by the line delta.
    Shifted,
    /// The edit touched the range's content.
    Overlapped,
}

/// Result of moving a range through one or more edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translated {
    pub range: LineRange,
    pub impact: EditImpact,
}

impl Translated {
    pub fn overlapped(&self) -> bool {
        self.impact == EditImpact::Overlapped
    }
}

fn shift(line: usize, delta: isize) -> usize {
    (line as isize + delta).max(0) as usize
}

/// Move a single range through a single edit.
///
/// For an overlapping edit the returned range is a candidate location: the
/// start stays put when the edit began inside the range, otherwise it
/// follows the surrounding text, clamped to the edit's start line.
pub fn apply_edit(range: LineRange, edit: &LineEdit) -> Translated {
    let delta = edit.line_delta();

    if edit.start_line() >= range.end {
        return Translated {
            range,
            impact: EditImpact::Untouched,
        };
    }

    if edit.ends_before_line(range.start) {
        return Translated {
            range: LineRange::new(shift(range.start, delta), shift(range.end, delta)),
            impact: EditImpact::Shifted,
        };
    }

    let start = if edit.start_line() < range.start {
        shift(range.start, delta).max(edit.start_line())
    } else {
        range.start
    };
    let end = shift(range.end, delta).max(start);

    Translated {
        range: LineRange::new(start, end),
        impact: EditImpact::Overlapped,
    }
}

/// Move every range through an ordered batch of edits.
///
/// Each edit is applied in the coordinates left by the previous one. A range
/// is reported as overlapped if any edit of the batch overlapped it;
/// otherwise `Shifted` if any edit moved it.
pub fn translate_batch(ranges: &[LineRange], edits: &[LineEdit]) -> Vec<Translated> {
    ranges
        .iter()
        .map(|&range| {
            let mut current = Translated {
                range,
                impact: EditImpact::Untouched,
            };
            for edit in edits {
                let next = apply_edit(current.range, edit);
                let impact = match (current.impact, next.impact) {
                    (EditImpact::Overlapped, _) | (_, EditImpact::Overlapped) => {
                        EditImpact::Overlapped
                    }
                    (EditImpact::Shifted, _) | (_, EditImpact::Shifted) => EditImpact::Shifted,
                    _ => EditImpact::Untouched,
                };
                current = Translated {
                    range: next.range,
                    impact,
                };
            }
            current
        })
        .collect()
}

/// Map a single line through a sequence of edits.
///
/// Used for hint lines captured before the edits happened. A line whose
/// content was rewritten maps to its candidate position.
pub fn map_line<'a>(line: usize, edits: impl IntoIterator<Item = &'a LineEdit>) -> usize {
    edits.into_iter().fold(line, |line, edit| {
        apply_edit(LineRange::new(line, line + 1), edit).range.start
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(start: usize, end: usize) -> LineRange {
        LineRange::new(start, end)
    }

    #[test]
    fn line_delta_counts_inserted_and_removed_lines() {
        assert_eq!(LineEdit::insert(0, 0, "a\nb\n").line_delta(), 2);
        assert_eq!(LineEdit::replace((0, 0), (2, 0), "").line_delta(), -2);
        assert_eq!(LineEdit::replace((1, 3), (1, 5), "xy").line_delta(), 0);
        assert_eq!(LineEdit::replace((1, 0), (4, 2), "q\r\n").line_delta(), -2);
    }

    #[test]
    fn edit_after_range_is_untouched() {
        let t = apply_edit(r(2, 4), &LineEdit::insert(4, 0, "x\n"));
        assert_eq!(t.impact, EditImpact::Untouched);
        assert_eq!(t.range, r(2, 4));
    }

    #[test]
    fn deleting_lines_above_shifts_up() {
        let t = apply_edit(r(2, 4), &LineEdit::replace((0, 0), (2, 0), ""));
        assert_eq!(t.impact, EditImpact::Shifted);
        assert_eq!(t.range, r(0, 2));
    }

    #[test]
    fn inserting_terminated_line_at_start_shifts_down() {
        let t = apply_edit(r(2, 4), &LineEdit::insert(2, 0, "new\n"));
        assert_eq!(t.impact, EditImpact::Shifted);
        assert_eq!(t.range, r(3, 5));
    }

    #[test]
    fn inserting_unterminated_text_at_start_overlaps() {
        let t = apply_edit(r(2, 4), &LineEdit::insert(2, 0, "x"));
        assert_eq!(t.impact, EditImpact::Overlapped);
        assert_eq!(t.range, r(2, 4));
    }

    #[test]
    fn joining_previous_line_overlaps() {
        // Removing the line break before the block glues text onto its delimiter.
        let t = apply_edit(r(2, 4), &LineEdit::replace((1, 5), (2, 0), ""));
        assert_eq!(t.impact, EditImpact::Overlapped);
        assert_eq!(t.range, r(1, 3));
    }

    #[test]
    fn same_line_edit_above_keeps_position() {
        let t = apply_edit(r(2, 4), &LineEdit::replace((1, 0), (1, 3), "longer text"));
        assert_eq!(t.impact, EditImpact::Shifted);
        assert_eq!(t.range, r(2, 4));
    }

    #[test]
    fn edit_inside_range_grows_it() {
        let t = apply_edit(r(2, 4), &LineEdit::insert(3, 0, "a\nb\n"));
        assert_eq!(t.impact, EditImpact::Overlapped);
        assert_eq!(t.range, r(2, 6));
    }

    #[test]
    fn edit_inside_range_shrinks_it() {
        let t = apply_edit(r(2, 6), &LineEdit::replace((3, 0), (5, 0), ""));
        assert_eq!(t.impact, EditImpact::Overlapped);
        assert_eq!(t.range, r(2, 4));
    }

    #[test]
    fn edit_swallowing_range_clamps_to_edit_start() {
        let t = apply_edit(r(2, 4), &LineEdit::replace((1, 0), (6, 0), ""));
        assert_eq!(t.impact, EditImpact::Overlapped);
        assert_eq!(t.range, r(1, 1));
    }

    #[test]
    fn batch_applies_edits_in_sequence() {
        // Second edit is expressed in coordinates left by the first one.
        let edits = vec![
            LineEdit::insert(0, 0, "a\nb\n"),
            LineEdit::replace((0, 0), (1, 0), ""),
        ];
        let got = translate_batch(&[r(2, 4), r(5, 6)], &edits);
        assert_eq!(got[0].range, r(3, 5));
        assert_eq!(got[1].range, r(6, 7));
        assert!(got.iter().all(|t| t.impact == EditImpact::Shifted));
    }

    #[test]
    fn batch_remembers_overlap() {
        let edits = vec![
            LineEdit::insert(2, 1, "x"),
            LineEdit::insert(0, 0, "top\n"),
        ];
        let got = translate_batch(&[r(2, 4)], &edits);
        assert!(got[0].overlapped());
        assert_eq!(got[0].range, r(3, 5));
    }

    #[test]
    fn shift_equals_sum_of_deltas_before_range() {
        let edits = vec![
            LineEdit::insert(0, 0, "1\n2\n3\n"),
            LineEdit::replace((1, 0), (2, 0), ""),
            LineEdit::insert(5, 4, "\n\n"),
            LineEdit::replace((0, 2), (0, 4), "zz"),
        ];
        let total: isize = edits.iter().map(LineEdit::line_delta).sum();
        let got = translate_batch(&[r(10, 12)], &edits);
        assert_eq!(got[0].range, r(10 + total as usize, 12 + total as usize));
    }

    #[test]
    fn map_line_follows_insertions_above() {
        let edits = [
            LineEdit::insert(0, 0, "x\n"),
            LineEdit::insert(0, 0, "y\n"),
        ];
        assert_eq!(map_line(2, &edits), 4);
        assert_eq!(map_line(0, &edits), 2);
    }
}

//! Re-anchoring of blocks whose text was damaged and later restored.

use std::cmp::Reverse;

use super::LineRange;

/// Pick the cell a deleted block comes back on, if any.
///
/// `matches` are the cells of the current text whose lines equal the
/// block's code. A match qualifies only if it overlaps `candidate`, the
/// block's translated range, and none of the `occupied` ranges. An empty
/// candidate stands for its start line. Among qualifying matches the one
/// starting closest to the candidate's start wins; on equal distance the
/// later one.
pub fn find_revival(
    matches: impl IntoIterator<Item = LineRange>,
    candidate: LineRange,
    occupied: &[LineRange],
) -> Option<LineRange> {
    let target = if candidate.start < candidate.end {
        candidate
    } else {
        LineRange::new(candidate.start, candidate.start + 1)
    };

    matches
        .into_iter()
        .filter(|m| m.overlaps(&target))
        .filter(|m| !occupied.iter().any(|r| r.overlaps(m)))
        .min_by_key(|m| (m.start.abs_diff(candidate.start), Reverse(m.start)))
}

/// Revival for blocks that never matched a cell: the code must be back,
/// line for line, exactly at `start`.
pub fn revive_in_place(
    lines: &[&str],
    code: &[&str],
    start: usize,
    occupied: &[LineRange],
) -> Option<LineRange> {
    let window = LineRange::new(start, start + code.len());
    if window.end > lines.len() || occupied.iter().any(|r| r.overlaps(&window)) {
        return None;
    }
    (lines[window.start..window.end] == *code).then_some(window)
}

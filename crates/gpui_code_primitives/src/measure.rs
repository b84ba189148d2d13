use std::ops::Range;

use smallvec::SmallVec;

use crate::document::Line;
use crate::engine::EditorEngine;

/// Splits a wrapped line into the sub-lines the engine rendered on separate
/// visual rows.
///
/// Positions are scanned left to right and a new sub-line starts wherever the
/// right edge moves leftward, which happens when the next character lands on
/// a new row. Each returned range runs from the first position of its row to
/// the last position before the next row starts, or to `line.to` for the
/// final row. Returns `None` when any scanned position has no coordinates.
pub fn rendered_sub_lines(
    engine: &dyn EditorEngine,
    line: &Line,
) -> Option<SmallVec<[Range<usize>; 4]>> {
    let mut sub_lines = SmallVec::new();
    let mut last_right = 0.;
    let mut start = line.from;

    for pos in line.from..line.to {
        let Some(coords) = engine.coords_at_pos(pos) else {
            // Bytes inside a multi-byte character are not positions.
            if !is_position(engine, pos) {
                continue;
            }
            return None;
        };

        if coords.right < last_right {
            sub_lines.push(start..previous_position(engine, pos, start));
            start = pos;
        }
        last_right = coords.right;
    }
    sub_lines.push(start..line.to);

    Some(sub_lines)
}

/// Returns the width `line` would occupy if it were rendered without wrapping.
///
/// Without wrapping this is the distance from the left edge of the line start
/// to the right edge of the line end. With wrapping, the widths of the
/// rendered sub-lines are summed, since they would sit side by side on one
/// row. Any unmeasurable position makes the whole line measure as zero.
pub fn natural_line_width(engine: &dyn EditorEngine, line: &Line, wrap_enabled: bool) -> f32 {
    let width = if wrap_enabled {
        rendered_sub_lines(engine, line).and_then(|sub_lines| {
            sub_lines.iter().try_fold(0., |total, sub_line| {
                span_width(engine, sub_line.start, sub_line.end).map(|width| total + width)
            })
        })
    } else {
        span_width(engine, line.from, line.to)
    };

    width.unwrap_or_else(|| {
        tracing::trace!(line = line.number, "line is not measurable");
        0.
    })
}

fn span_width(engine: &dyn EditorEngine, from: usize, to: usize) -> Option<f32> {
    let end = engine.coords_at_pos(to)?;
    let start = engine.coords_at_pos(from)?;
    Some((end.right - start.left).max(0.))
}

fn is_position(engine: &dyn EditorEngine, pos: usize) -> bool {
    engine.snapshot().text().is_char_boundary(pos)
}

/// The closest position before `pos` that is not inside a character.
fn previous_position(engine: &dyn EditorEngine, pos: usize, floor: usize) -> usize {
    let snapshot = engine.snapshot();
    let text = snapshot.text();
    (floor..pos)
        .rev()
        .find(|&candidate| text.is_char_boundary(candidate))
        .unwrap_or(floor)
}

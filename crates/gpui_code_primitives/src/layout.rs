use std::cell::RefCell;
use std::ops::Range;
use std::sync::Arc;

use smallvec::SmallVec;
use unicode_segmentation::UnicodeSegmentation;

use crate::document::{DocumentSnapshot, Line};
use crate::engine::{Coords, EditorEngine, EditorSetup, EngineError, LayoutListener, LayoutUpdate};

/// One visually rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualRow {
    /// 1-based number of the source line this row belongs to.
    pub line_number: usize,
    /// Byte range of the row's text.
    pub range: Range<usize>,
    /// Whether this row starts its source line (and so carries a line number).
    pub starts_line: bool,
}

/// Grapheme boundaries of a source line and how they are split into rows.
#[derive(Debug, Clone)]
struct LineLayout {
    line: Line,
    /// Start offsets of every grapheme in the line.
    graphemes: SmallVec<[usize; 32]>,
    /// Index of the first visual row of this line.
    first_row: usize,
    /// Graphemes per row, `usize::MAX` when the line is not wrapped.
    columns: usize,
}

impl LineLayout {
    fn row_count(&self) -> usize {
        if self.graphemes.is_empty() {
            1
        } else {
            self.graphemes.len().div_ceil(self.columns)
        }
    }

    /// Visual row index and column of the caret before `pos`.
    fn row_and_column(&self, pos: usize) -> Option<(usize, usize)> {
        let index = if pos == self.line.to {
            self.graphemes.len()
        } else {
            // Positions inside a grapheme belong to the grapheme they split.
            match self.graphemes.binary_search(&pos) {
                Ok(index) => index,
                Err(index) => index.checked_sub(1)?,
            }
        };

        if index == self.graphemes.len() {
            let last_row = self.row_count() - 1;
            let column = index - last_row.saturating_mul(self.columns).min(index);
            return Some((self.first_row + last_row, column));
        }

        let row = index / self.columns;
        Some((self.first_row + row, index - row * self.columns))
    }
}

#[derive(Debug, Clone)]
struct Metrics {
    char_advance: f32,
    line_height: f32,
    inset_left: f32,
    wrap_width: Option<f32>,
}

struct LayoutState {
    doc: DocumentSnapshot,
    setup: EditorSetup,
    metrics: Metrics,
    viewport_rows: Option<Range<usize>>,
    lines: Option<Arc<[LineLayout]>>,
    detached: bool,
}

impl LayoutState {
    fn columns(&self) -> usize {
        match (self.setup.line_wrapping, self.metrics.wrap_width) {
            (true, Some(width)) if self.metrics.char_advance > 0. => {
                ((width / self.metrics.char_advance).floor() as usize).max(1)
            }
            _ => usize::MAX,
        }
    }

    fn compute_lines(&self) -> Arc<[LineLayout]> {
        let columns = self.columns();
        let mut first_row = 0;

        self.doc
            .lines()
            .map(|line| {
                let graphemes = self
                    .doc
                    .line_text(&line)
                    .grapheme_indices(true)
                    .map(|(offset, _)| line.from + offset)
                    .collect();
                let layout = LineLayout {
                    line,
                    graphemes,
                    first_row,
                    columns,
                };
                first_row += layout.row_count();
                layout
            })
            .collect()
    }

    /// Returns the line layouts, measuring first if needed. The flag reports
    /// whether a measure happened.
    fn measured(&mut self) -> (Arc<[LineLayout]>, bool) {
        if let Some(lines) = &self.lines {
            return (lines.clone(), false);
        }
        let lines = self.compute_lines();
        self.lines = Some(lines.clone());
        (lines, true)
    }
}

/// A layout engine where every grapheme cluster advances by the same width.
///
/// Layout is lazy: changes only invalidate it, and the next query measures.
/// Each measure notifies subscribers with a geometry change, so listeners can
/// be re-entered from inside their own coordinate queries.
pub struct MonospaceLayout {
    state: RefCell<LayoutState>,
    listeners: RefCell<Vec<LayoutListener>>,
}

impl MonospaceLayout {
    /// Creates an engine holding `text`, configured with `setup`.
    pub fn new(text: &str, setup: EditorSetup) -> Self {
        Self {
            state: RefCell::new(LayoutState {
                doc: DocumentSnapshot::from_text(text),
                setup,
                metrics: Metrics {
                    char_advance: 8.,
                    line_height: 20.,
                    inset_left: 0.,
                    wrap_width: None,
                },
                viewport_rows: None,
                lines: None,
                detached: false,
            }),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// The setup this engine was created with, with the current wrap slot.
    pub fn setup(&self) -> EditorSetup {
        self.state.borrow().setup.clone()
    }

    /// Whether user edits are accepted.
    pub fn is_editable(&self) -> bool {
        self.state.borrow().setup.editable
    }

    /// Horizontal advance of one grapheme.
    pub fn char_advance(&self) -> f32 {
        self.state.borrow().metrics.char_advance
    }

    /// Height of one visual row.
    pub fn line_height(&self) -> f32 {
        self.state.borrow().metrics.line_height
    }

    /// Sets the horizontal advance of one grapheme.
    pub fn set_char_advance(&self, advance: f32) {
        self.update_metrics(|metrics| metrics.char_advance = advance.max(0.));
    }

    /// Sets the height of one visual row.
    pub fn set_line_height(&self, line_height: f32) {
        self.update_metrics(|metrics| metrics.line_height = line_height.max(0.));
    }

    /// Sets the left offset of the text inside the content area.
    pub fn set_inset_left(&self, inset: f32) {
        self.update_metrics(|metrics| metrics.inset_left = inset);
    }

    /// Sets the width available to a row when wrapping. `None` disables
    /// wrapping even when the wrap slot is on.
    pub fn set_wrap_width(&self, width: Option<f32>) {
        self.update_metrics(|metrics| metrics.wrap_width = width);
    }

    /// Restricts which visual rows are rendered. Positions outside the range
    /// have no coordinates. `None` renders every row.
    pub fn set_viewport_rows(&self, rows: Option<Range<usize>>) {
        let changed = {
            let mut state = self.state.borrow_mut();
            if state.viewport_rows == rows {
                false
            } else {
                state.viewport_rows = rows;
                true
            }
        };
        if changed {
            self.emit(&LayoutUpdate::geometry());
        }
    }

    /// Tears down the view. Later mutations fail with [`EngineError::Detached`]
    /// and no position has coordinates.
    pub fn detach(&self) {
        let mut state = self.state.borrow_mut();
        state.detached = true;
        state.lines = None;
    }

    /// All visual rows in order, measuring first if needed.
    pub fn visual_rows(&self) -> Vec<VisualRow> {
        let (lines, measured) = self.state.borrow_mut().measured();
        if measured {
            self.emit(&LayoutUpdate::geometry());
        }

        let mut rows = Vec::new();
        for layout in lines.iter() {
            let count = layout.row_count();
            for row in 0..count {
                let start = layout
                    .graphemes
                    .get(row.saturating_mul(layout.columns))
                    .copied()
                    .unwrap_or(layout.line.from);
                let end = layout
                    .graphemes
                    .get((row + 1).saturating_mul(layout.columns))
                    .copied()
                    .unwrap_or(layout.line.to);
                rows.push(VisualRow {
                    line_number: layout.line.number,
                    range: start..end,
                    starts_line: row == 0,
                });
            }
        }
        rows
    }

    fn update_metrics(&self, f: impl FnOnce(&mut Metrics)) {
        let changed = {
            let mut state = self.state.borrow_mut();
            let before = state.metrics.clone();
            f(&mut state.metrics);
            let after = &state.metrics;
            let changed = before.char_advance != after.char_advance
                || before.line_height != after.line_height
                || before.inset_left != after.inset_left
                || before.wrap_width != after.wrap_width;
            if changed {
                state.lines = None;
            }
            changed
        };
        if changed {
            self.emit(&LayoutUpdate::geometry());
        }
    }

    fn set_document(&self, doc: DocumentSnapshot) {
        {
            let mut state = self.state.borrow_mut();
            state.doc = doc;
            state.lines = None;
        }
        self.emit(&LayoutUpdate::edit());
    }

    fn emit(&self, update: &LayoutUpdate) {
        // Listeners may query or mutate the engine, so no borrow is held here.
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(update);
        }
    }
}

impl EditorEngine for MonospaceLayout {
    fn snapshot(&self) -> DocumentSnapshot {
        self.state.borrow().doc.clone()
    }

    fn coords_at_pos(&self, pos: usize) -> Option<Coords> {
        let (coords, measured) = {
            let mut state = self.state.borrow_mut();
            if state.detached || !state.doc.text().is_char_boundary(pos) {
                return None;
            }
            let (lines, measured) = state.measured();
            let line = state.doc.line_at(pos);

            let coords = line.and_then(|line| {
                let (row, column) = lines[line.number - 1].row_and_column(pos)?;
                if let Some(viewport) = &state.viewport_rows {
                    if !viewport.contains(&row) {
                        return None;
                    }
                }

                let metrics = &state.metrics;
                let left = metrics.inset_left + column as f32 * metrics.char_advance;
                let right = if pos == line.to {
                    left
                } else {
                    left + metrics.char_advance
                };
                let top = row as f32 * metrics.line_height;
                Some(Coords {
                    left,
                    right,
                    top,
                    bottom: top + metrics.line_height,
                })
            });
            (coords, measured)
        };

        if measured {
            self.emit(&LayoutUpdate::geometry());
        }
        coords
    }

    fn content_height(&self) -> f32 {
        let (height, measured) = {
            let mut state = self.state.borrow_mut();
            let (lines, measured) = state.measured();
            let rows: usize = lines.iter().map(LineLayout::row_count).sum();
            (rows as f32 * state.metrics.line_height, measured)
        };

        if measured {
            self.emit(&LayoutUpdate::geometry());
        }
        height
    }

    fn set_viewport_width(&self, width: f32) {
        self.set_wrap_width(Some(width.max(0.)));
    }

    fn line_wrapping(&self) -> bool {
        self.state.borrow().setup.line_wrapping
    }

    fn set_line_wrapping(&self, enabled: bool) -> Result<(), EngineError> {
        {
            let mut state = self.state.borrow_mut();
            if state.detached {
                return Err(EngineError::Detached);
            }
            if state.setup.line_wrapping == enabled {
                return Ok(());
            }
            state.setup.line_wrapping = enabled;
            state.lines = None;
        }
        tracing::trace!(enabled, "reconfigured line wrapping");
        self.emit(&LayoutUpdate::geometry());
        Ok(())
    }

    fn replace_text(&self, text: &str) -> Result<(), EngineError> {
        if self.state.borrow().detached {
            return Err(EngineError::Detached);
        }
        self.set_document(DocumentSnapshot::from_text(text));
        Ok(())
    }

    fn apply_edit(&self, range: Range<usize>, text: &str) -> Result<(), EngineError> {
        let doc = {
            let state = self.state.borrow();
            if state.detached {
                return Err(EngineError::Detached);
            }
            if !state.setup.editable {
                return Err(EngineError::ReadOnly);
            }

            let current = state.doc.text();
            let valid = range.start <= range.end
                && range.end <= current.len()
                && current.is_char_boundary(range.start)
                && current.is_char_boundary(range.end);
            if !valid {
                return Err(EngineError::InvalidRange {
                    start: range.start,
                    end: range.end,
                    len: current.len(),
                });
            }

            let mut edited = String::with_capacity(current.len() + text.len());
            edited.push_str(&current[..range.start]);
            edited.push_str(text);
            edited.push_str(&current[range.end..]);
            DocumentSnapshot::from_text(edited)
        };

        self.set_document(doc);
        Ok(())
    }

    fn subscribe(&self, listener: LayoutListener) {
        self.listeners.borrow_mut().push(listener);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn engine(text: &str) -> MonospaceLayout {
        let engine = MonospaceLayout::new(text, EditorSetup::default());
        engine.set_char_advance(10.);
        engine.set_line_height(20.);
        engine
    }

    #[test]
    fn test_unwrapped_coords() {
        let engine = engine("abc\nde");

        let first = engine.coords_at_pos(0).unwrap();
        assert_eq!((first.left, first.right), (0., 10.));

        let end = engine.coords_at_pos(3).unwrap();
        assert_eq!((end.left, end.right), (30., 30.));

        let second_line = engine.coords_at_pos(4).unwrap();
        assert_eq!(second_line.top, 20.);
        assert_eq!(second_line.left, 0.);
    }

    #[test]
    fn test_crlf_line_ends_before_carriage_return() {
        let engine = engine("ab\r\ncd");

        let end = engine.coords_at_pos(2).unwrap();
        assert_eq!((end.left, end.top), (20., 0.));
        assert_eq!(engine.coords_at_pos(3), None);

        let second_line = engine.coords_at_pos(4).unwrap();
        assert_eq!((second_line.left, second_line.top), (0., 20.));
    }

    #[test]
    fn test_wrapping_splits_rows() {
        let engine = engine("abcdefg");
        engine.set_wrap_width(Some(30.));
        engine.set_line_wrapping(true).unwrap();

        let rows = engine.visual_rows();
        let ranges: Vec<_> = rows.iter().map(|row| row.range.clone()).collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..7]);
        assert!(rows[0].starts_line);
        assert!(!rows[1].starts_line);

        assert_eq!(engine.content_height(), 60.);
        let wrapped = engine.coords_at_pos(3).unwrap();
        assert_eq!((wrapped.left, wrapped.top), (0., 20.));
    }

    #[test]
    fn test_wrap_width_ignored_without_wrap_slot() {
        let engine = engine("abcdefg");
        engine.set_wrap_width(Some(30.));

        assert_eq!(engine.visual_rows().len(), 1);
        assert_eq!(engine.content_height(), 20.);
    }

    #[test]
    fn test_positions_outside_viewport_have_no_coords() {
        let engine = engine("a\nb\nc");
        engine.set_viewport_rows(Some(0..2));

        assert!(engine.coords_at_pos(0).is_some());
        assert!(engine.coords_at_pos(2).is_some());
        assert!(engine.coords_at_pos(4).is_none());
    }

    #[test]
    fn test_inside_character_has_no_coords() {
        let engine = engine("\u{e9}x");
        assert!(engine.coords_at_pos(0).is_some());
        assert!(engine.coords_at_pos(1).is_none());
        assert_eq!(engine.coords_at_pos(2).unwrap().left, 10.);
    }

    #[test]
    fn test_combining_mark_shares_grapheme_coords() {
        let engine = engine("e\u{301}x");
        let base = engine.coords_at_pos(0).unwrap();
        let mark = engine.coords_at_pos(1).unwrap();
        assert_eq!(base, mark);
        assert_eq!(engine.coords_at_pos(3).unwrap().left, 10.);
    }

    #[test]
    fn test_measure_notifies_once_per_invalidation() {
        let engine = Rc::new(engine("abc"));
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        engine.subscribe(Rc::new(move |update: &LayoutUpdate| {
            assert!(update.geometry_changed);
            counter.set(counter.get() + 1);
        }));

        engine.coords_at_pos(0);
        engine.coords_at_pos(1);
        assert_eq!(count.get(), 1);

        engine.set_line_wrapping(true).unwrap();
        assert_eq!(count.get(), 2);
        engine.set_line_wrapping(true).unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_listener_can_reenter_engine() {
        let engine = Rc::new(engine("abc"));
        let weak = Rc::downgrade(&engine);
        let seen = Rc::new(Cell::new(None));
        let seen_in_listener = seen.clone();
        engine.subscribe(Rc::new(move |_update: &LayoutUpdate| {
            if let Some(engine) = weak.upgrade() {
                seen_in_listener.set(engine.coords_at_pos(3).map(|coords| coords.left));
            }
        }));

        engine.replace_text("abcd").unwrap();
        assert_eq!(seen.get(), Some(30.));
    }

    #[test]
    fn test_read_only_rejects_user_edits() {
        let setup = EditorSetup {
            editable: false,
            ..EditorSetup::default()
        };
        let engine = MonospaceLayout::new("abc", setup);

        assert_eq!(engine.apply_edit(0..1, "x"), Err(EngineError::ReadOnly));
        assert!(engine.replace_text("xyz").is_ok());
        assert_eq!(engine.text(), "xyz");
    }

    #[test]
    fn test_apply_edit() {
        let engine = engine("let x = 1;");
        engine.apply_edit(8..9, "42").unwrap();
        assert_eq!(engine.text(), "let x = 42;");

        assert_eq!(
            engine.apply_edit(5..100, ""),
            Err(EngineError::InvalidRange {
                start: 5,
                end: 100,
                len: 11
            })
        );
    }

    #[test]
    fn test_detached_engine() {
        let engine = engine("abc");
        engine.detach();

        assert!(engine.coords_at_pos(0).is_none());
        assert_eq!(engine.set_line_wrapping(true), Err(EngineError::Detached));
        assert_eq!(engine.replace_text("x"), Err(EngineError::Detached));
    }
}

use std::ops::Range;
use std::rc::Rc;

use gpui::{
    App, Bounds, Context, ElementId, ElementInputHandler, Entity, EntityInputHandler, FocusHandle,
    Focusable, InteractiveElement, IntoElement, KeyBinding, MouseButton, MouseDownEvent,
    ParentElement, Pixels, Render, RenderOnce, SharedString, Styled, TextRun, UTF16Selection,
    Window, actions, canvas, div, point, prelude::FluentBuilder, px,
};
use gpui_code_primitives::{EditorEngine, MonospaceLayout};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    ElementIdExt,
    field::{CodeEditorField, Field},
    host::{RerenderFlag, SharedMetrics, WorkspaceKind},
    panel::{PanelContainer, PanelController, PanelGeometry},
    theme::{EditorTheme, ThemeExt},
};

actions!(code_editor, [Backspace, Delete, Left, Right, Newline]);

const KEY_CONTEXT: &str = "CodeEditor";

pub(crate) fn bind_keys(cx: &mut App) {
    cx.bind_keys([
        KeyBinding::new("backspace", Backspace, Some(KEY_CONTEXT)),
        KeyBinding::new("delete", Delete, Some(KEY_CONTEXT)),
        KeyBinding::new("left", Left, Some(KEY_CONTEXT)),
        KeyBinding::new("right", Right, Some(KEY_CONTEXT)),
        KeyBinding::new("enter", Newline, Some(KEY_CONTEXT)),
    ]);
}

/// State of an embedded code editor: the field, its layout engine and the
/// controller sizing the panel.
pub struct CodeEditorState {
    pub focus_handle: FocusHandle,
    field: CodeEditorField,
    engine: Rc<MonospaceLayout>,
    controller: Rc<PanelController>,
    metrics: Rc<SharedMetrics>,
    rerender: Rc<RerenderFlag>,
    /// Byte offset of the caret.
    cursor: usize,
    marked_range: Option<Range<usize>>,
    last_bounds: Option<Bounds<Pixels>>,
}

impl CodeEditorState {
    pub fn new(
        mut field: CodeEditorField,
        workspace: WorkspaceKind,
        toolbox_width: f32,
        cx: &mut Context<Self>,
    ) -> Self {
        let metrics = Rc::new(SharedMetrics::new(0., toolbox_width));
        let rerender = Rc::new(RerenderFlag::default());
        let (engine, controller) = field.init_view(
            workspace,
            MonospaceLayout::new,
            metrics.clone(),
            rerender.clone(),
        );
        let cursor = engine.snapshot().len();

        Self {
            focus_handle: cx.focus_handle().tab_stop(true),
            field,
            engine,
            controller,
            metrics,
            rerender,
            cursor,
            marked_range: None,
            last_bounds: None,
        }
    }

    pub fn field(&self) -> &CodeEditorField {
        &self.field
    }

    pub fn engine(&self) -> &Rc<MonospaceLayout> {
        &self.engine
    }

    pub fn controller(&self) -> &Rc<PanelController> {
        &self.controller
    }

    pub fn geometry(&self) -> PanelGeometry {
        self.controller.geometry()
    }

    pub fn is_editable(&self) -> bool {
        self.engine.is_editable()
    }

    pub fn cursor_offset(&self) -> usize {
        self.cursor
    }

    /// Feeds window and font metrics into the layout. Returns whether the
    /// panel was resized since the last call.
    pub fn sync(&self, available_width: f32, char_advance: f32, line_height: f32) -> bool {
        let width_changed = self.metrics.set_available_width(available_width);
        self.engine.set_char_advance(char_advance);
        self.engine.set_line_height(line_height);
        if width_changed {
            self.controller.refresh();
        }
        self.rerender.take()
    }

    pub fn set_toolbox_width(&mut self, width: f32, cx: &mut Context<Self>) {
        if self.metrics.set_toolbox_width(width) {
            self.controller.refresh();
        }
        self.notify_if_resized(cx);
    }

    pub fn set_value(&mut self, value: &str, cx: &mut Context<Self>) -> bool {
        let changed = self.field.set_value(value);
        if changed {
            self.cursor = self.engine.snapshot().len();
            self.marked_range = None;
            cx.notify();
        }
        self.notify_if_resized(cx);
        changed
    }

    fn notify_if_resized(&self, cx: &mut Context<Self>) {
        if self.rerender.take() {
            cx.notify();
        }
    }

    /// Applies a user edit. Read-only editors leave the text unchanged.
    fn edit(&mut self, range: Range<usize>, new_text: &str, cx: &mut Context<Self>) -> bool {
        if let Err(err) = self.engine.apply_edit(range.clone(), new_text) {
            tracing::trace!(%err, "code editor ignored an edit");
            return false;
        }

        self.cursor = range.start + new_text.len();
        self.marked_range = None;
        // The text changed, so repaint whether or not the panel was resized.
        self.rerender.take();
        cx.notify();
        true
    }

    fn move_to(&mut self, offset: usize, cx: &mut Context<Self>) {
        self.cursor = offset;
        cx.notify();
    }

    fn previous_boundary(&self, offset: usize) -> usize {
        self.engine
            .snapshot()
            .text()
            .grapheme_indices(true)
            .rev()
            .find_map(|(idx, _)| (idx < offset).then_some(idx))
            .unwrap_or(0)
    }

    fn next_boundary(&self, offset: usize) -> usize {
        let snapshot = self.engine.snapshot();
        snapshot
            .text()
            .grapheme_indices(true)
            .find_map(|(idx, _)| (idx > offset).then_some(idx))
            .unwrap_or(snapshot.len())
    }

    pub fn backspace(&mut self, _: &Backspace, _: &mut Window, cx: &mut Context<Self>) {
        if self.cursor > 0 {
            let start = self.previous_boundary(self.cursor);
            self.edit(start..self.cursor, "", cx);
        }
    }

    pub fn delete(&mut self, _: &Delete, _: &mut Window, cx: &mut Context<Self>) {
        if self.cursor < self.engine.snapshot().len() {
            let end = self.next_boundary(self.cursor);
            self.edit(self.cursor..end, "", cx);
        }
    }

    pub fn left(&mut self, _: &Left, _: &mut Window, cx: &mut Context<Self>) {
        self.move_to(self.previous_boundary(self.cursor), cx);
    }

    pub fn right(&mut self, _: &Right, _: &mut Window, cx: &mut Context<Self>) {
        self.move_to(self.next_boundary(self.cursor), cx);
    }

    pub fn newline(&mut self, _: &Newline, _: &mut Window, cx: &mut Context<Self>) {
        self.edit(self.cursor..self.cursor, "\n", cx);
    }

    pub fn on_mouse_down(
        &mut self,
        event: &MouseDownEvent,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.focus_handle.focus(window, cx);
        if let Some(offset) = self.offset_for_point(event.position) {
            self.move_to(offset, cx);
        }
    }

    /// Byte offset of the grapheme nearest to a window position.
    fn offset_for_point(&self, position: gpui::Point<Pixels>) -> Option<usize> {
        let local = self.last_bounds?.localize(&position)?;
        let x = local.x.to_f64() as f32 - self.controller.config().gutter_width;
        let y = local.y.to_f64() as f32;

        let rows = self.engine.visual_rows();
        let row_index = (y / self.engine.line_height()).max(0.) as usize;
        let row = rows.get(row_index).or(rows.last())?;
        let column = (x / self.engine.char_advance()).round().max(0.) as usize;

        let snapshot = self.engine.snapshot();
        Some(
            snapshot.text()[row.range.clone()]
                .grapheme_indices(true)
                .nth(column)
                .map_or(row.range.end, |(idx, _)| row.range.start + idx),
        )
    }

    fn offset_from_utf16(&self, offset: usize) -> usize {
        let mut utf8_offset = 0;
        let mut utf16_count = 0;

        for ch in self.engine.snapshot().text().chars() {
            if utf16_count >= offset {
                break;
            }
            utf16_count += ch.len_utf16();
            utf8_offset += ch.len_utf8();
        }

        utf8_offset
    }

    fn offset_to_utf16(&self, offset: usize) -> usize {
        let mut utf16_offset = 0;
        let mut utf8_count = 0;

        for ch in self.engine.snapshot().text().chars() {
            if utf8_count >= offset {
                break;
            }
            utf8_count += ch.len_utf8();
            utf16_offset += ch.len_utf16();
        }

        utf16_offset
    }

    fn range_to_utf16(&self, range: &Range<usize>) -> Range<usize> {
        self.offset_to_utf16(range.start)..self.offset_to_utf16(range.end)
    }

    fn range_from_utf16(&self, range_utf16: &Range<usize>) -> Range<usize> {
        self.offset_from_utf16(range_utf16.start)..self.offset_from_utf16(range_utf16.end)
    }

    fn target_range(&self, range_utf16: Option<&Range<usize>>) -> Range<usize> {
        range_utf16
            .map(|range_utf16| self.range_from_utf16(range_utf16))
            .or(self.marked_range.clone())
            .unwrap_or(self.cursor..self.cursor)
    }
}

impl EntityInputHandler for CodeEditorState {
    fn text_for_range(
        &mut self,
        range_utf16: Range<usize>,
        actual_range: &mut Option<Range<usize>>,
        _window: &mut Window,
        _cx: &mut Context<Self>,
    ) -> Option<String> {
        let range = self.range_from_utf16(&range_utf16);
        actual_range.replace(self.range_to_utf16(&range));
        Some(self.engine.snapshot().text()[range].to_string())
    }

    fn selected_text_range(
        &mut self,
        _ignore_disabled_input: bool,
        _window: &mut Window,
        _cx: &mut Context<Self>,
    ) -> Option<UTF16Selection> {
        Some(UTF16Selection {
            range: self.range_to_utf16(&(self.cursor..self.cursor)),
            reversed: false,
        })
    }

    fn marked_text_range(
        &self,
        _window: &mut Window,
        _cx: &mut Context<Self>,
    ) -> Option<Range<usize>> {
        self.marked_range
            .as_ref()
            .map(|range| self.range_to_utf16(range))
    }

    fn unmark_text(&mut self, _window: &mut Window, _cx: &mut Context<Self>) {
        self.marked_range = None;
    }

    fn replace_text_in_range(
        &mut self,
        range_utf16: Option<Range<usize>>,
        new_text: &str,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let range = self.target_range(range_utf16.as_ref());
        self.edit(range, new_text, cx);
    }

    fn replace_and_mark_text_in_range(
        &mut self,
        range_utf16: Option<Range<usize>>,
        new_text: &str,
        _new_selected_range_utf16: Option<Range<usize>>,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let range = self.target_range(range_utf16.as_ref());
        if self.edit(range.clone(), new_text, cx) && !new_text.is_empty() {
            self.marked_range = Some(range.start..range.start + new_text.len());
        }
    }

    fn bounds_for_range(
        &mut self,
        range_utf16: Range<usize>,
        bounds: Bounds<Pixels>,
        _window: &mut Window,
        _cx: &mut Context<Self>,
    ) -> Option<Bounds<Pixels>> {
        let range = self.range_from_utf16(&range_utf16);
        let gutter_width = self.controller.config().gutter_width;
        let start = self.engine.coords_at_pos(range.start)?;
        let end = self.engine.coords_at_pos(range.end).unwrap_or(start);

        Some(Bounds::from_corners(
            point(
                bounds.left() + px(gutter_width + start.left),
                bounds.top() + px(start.top),
            ),
            point(
                bounds.left() + px(gutter_width + end.right.max(start.left)),
                bounds.top() + px(end.bottom),
            ),
        ))
    }

    fn character_index_for_point(
        &mut self,
        point: gpui::Point<Pixels>,
        _window: &mut Window,
        _cx: &mut Context<Self>,
    ) -> Option<usize> {
        let offset = self.offset_for_point(point)?;
        Some(self.offset_to_utf16(offset))
    }
}

impl Focusable for CodeEditorState {
    fn focus_handle(&self, _cx: &App) -> FocusHandle {
        self.focus_handle.clone()
    }
}

impl Render for CodeEditorState {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        CodeEditor::new(cx.entity_id(), cx.entity())
    }
}

/// Horizontal advance of one monospace cell.
fn measure_char_advance(window: &mut Window, theme: &EditorTheme) -> f32 {
    let run = TextRun {
        len: 1,
        font: theme.font.font(),
        color: theme.colors.foreground.into(),
        background_color: None,
        underline: None,
        strikethrough: None,
    };
    let shaped = window
        .text_system()
        .shape_line("m".into(), theme.font.size, &[run], None);

    shaped.width.to_f64() as f32
}

/// An auto-sizing, editable code panel with a line-number gutter.
#[derive(IntoElement)]
pub struct CodeEditor {
    id: ElementId,
    state: Entity<CodeEditorState>,
}

impl CodeEditor {
    pub fn new(id: impl Into<ElementId>, state: Entity<CodeEditorState>) -> Self {
        Self {
            id: id.into(),
            state,
        }
    }
}

impl RenderOnce for CodeEditor {
    fn render(self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        let theme_name = self.state.read(cx).engine.setup().theme;
        let theme = cx.resolve_theme(&theme_name).clone();
        let char_advance = measure_char_advance(window, &theme);
        let available_width = window.viewport_size().width.to_f64() as f32;
        let line_height = theme.font.line_height.to_f64() as f32;

        let state = self.state.read(cx);
        // This frame reads the synced geometry, so the request is already served.
        state.sync(available_width, char_advance, line_height);

        let geometry = state.geometry();
        let PanelContainer {
            min_width,
            min_height,
            ..
        } = state.controller.container();
        let gutter_width = state.controller.config().gutter_width;
        let is_editable = state.is_editable();
        let focus_handle = state.focus_handle.clone();
        let caret = focus_handle
            .is_focused(window)
            .then(|| state.engine.coords_at_pos(state.cursor))
            .flatten();
        let snapshot = state.engine.snapshot();
        let rows = state.engine.visual_rows();

        let gutter = div()
            .id(self.id.with_suffix("gutter"))
            .flex_none()
            .flex()
            .flex_col()
            .w(px(gutter_width))
            .bg(theme.colors.gutter_background)
            .text_color(theme.colors.gutter_foreground)
            .children(rows.iter().map(|row| {
                let label: SharedString = if row.starts_line {
                    row.line_number.to_string().into()
                } else {
                    SharedString::default()
                };
                div().h(theme.font.line_height).child(label)
            }));

        let content = div()
            .id(self.id.with_suffix("content"))
            .relative()
            .flex_1()
            .flex()
            .flex_col()
            .overflow_hidden()
            .text_color(theme.colors.foreground)
            .children(rows.iter().map(|row| {
                let text: SharedString = snapshot.text()[row.range.clone()].to_owned().into();
                div()
                    .h(theme.font.line_height)
                    .whitespace_nowrap()
                    .child(text)
            }))
            .when_some(caret, |this, caret| {
                this.child(
                    div()
                        .absolute()
                        .left(px(caret.left))
                        .top(px(caret.top))
                        .w(px(1.))
                        .h(theme.font.line_height)
                        .bg(theme.colors.foreground),
                )
            });

        let input_state = self.state.clone();
        let input_focus_handle = focus_handle.clone();
        let input_handler = canvas(
            |_bounds, _window, _cx| (),
            move |bounds, (), window, cx| {
                input_state.update(cx, |state, _cx| state.last_bounds = Some(bounds));
                window.handle_input(
                    &input_focus_handle,
                    ElementInputHandler::new(bounds, input_state.clone()),
                    cx,
                );
            },
        )
        .absolute()
        .size_full();

        div()
            .id(self.id.clone())
            .key_context(KEY_CONTEXT)
            .when(is_editable, |this| {
                this.track_focus(&focus_handle)
                    .on_action(window.listener_for(&self.state, CodeEditorState::backspace))
                    .on_action(window.listener_for(&self.state, CodeEditorState::delete))
                    .on_action(window.listener_for(&self.state, CodeEditorState::left))
                    .on_action(window.listener_for(&self.state, CodeEditorState::right))
                    .on_action(window.listener_for(&self.state, CodeEditorState::newline))
                    .on_mouse_down(
                        MouseButton::Left,
                        window.listener_for(&self.state, CodeEditorState::on_mouse_down),
                    )
            })
            .relative()
            .flex()
            .w(px(geometry.width))
            .h(px(geometry.height))
            .min_w(px(min_width))
            .min_h(px(min_height))
            .overflow_hidden()
            .bg(theme.colors.background)
            .border_1()
            .border_color(theme.colors.border)
            .font_family(theme.font.family[0].clone())
            .text_size(theme.font.size)
            .line_height(theme.font.line_height)
            .child(input_handler)
            .child(gutter)
            .child(content)
    }
}

#[cfg(all(test, feature = "test-support"))]
mod tests {
    use super::*;
    use crate::field::FieldConfig;
    use gpui::{AppContext, TestAppContext, VisualTestContext};

    fn field(value: &str) -> CodeEditorField {
        CodeEditorField::new(Some(value.into()), None, FieldConfig::default())
    }

    #[gpui::test]
    fn test_state_starts_at_initial_size(cx: &mut TestAppContext) {
        let state = cx.new(|cx| CodeEditorState::new(field("x"), WorkspaceKind::Main, 200., cx));

        state.read_with(cx, |state, _| {
            let geometry = state.geometry();
            assert_eq!(geometry.width, 500., "Panel should start at initial width");
            assert_eq!(geometry.height, 200., "Panel should start at initial height");
            assert!(!geometry.wrap_enabled, "Panel should start unwrapped");
        });
    }

    #[gpui::test]
    fn test_sync_grows_panel(cx: &mut TestAppContext) {
        let state = cx.new(|cx| {
            CodeEditorState::new(field(&"a".repeat(80)), WorkspaceKind::Main, 200., cx)
        });

        state.read_with(cx, |state, _| {
            assert!(state.sync(1600., 10., 20.), "First sync should resize");
            assert_eq!(state.geometry().width, 830.);
            assert!(!state.sync(1600., 10., 20.), "Same metrics should not resize");
        });
    }

    #[gpui::test]
    fn test_sync_wraps_in_narrow_window(cx: &mut TestAppContext) {
        let state = cx.new(|cx| {
            CodeEditorState::new(field(&"a".repeat(300)), WorkspaceKind::Main, 200., cx)
        });

        state.read_with(cx, |state, _| {
            state.sync(1600., 10., 20.);
            assert_eq!(state.geometry().width, 980.);
            assert!(state.geometry().wrap_enabled);

            state.sync(600., 10., 20.);
            assert_eq!(
                state.geometry().width,
                500.,
                "Wrapped panel should not shrink below its initial width"
            );
            assert!(state.geometry().wrap_enabled);
        });
    }

    #[gpui::test]
    fn test_set_value_resizes(cx: &mut TestAppContext) {
        let state = cx.new(|cx| CodeEditorState::new(field("x"), WorkspaceKind::Main, 200., cx));
        state.read_with(cx, |state, _| {
            state.sync(1600., 10., 20.);
        });

        state.update(cx, |state, cx| {
            assert!(state.set_value(&"b".repeat(90), cx));
        });

        state.read_with(cx, |state, _| {
            assert_eq!(state.geometry().width, 930.);
            assert_eq!(state.field().value(), "b".repeat(90));
        });
    }

    #[gpui::test]
    fn test_toolbox_width_changes_limit(cx: &mut TestAppContext) {
        let state = cx.new(|cx| {
            CodeEditorState::new(field(&"a".repeat(90)), WorkspaceKind::Main, 200., cx)
        });
        state.read_with(cx, |state, _| {
            state.sync(1600., 10., 20.);
            assert_eq!(state.geometry().width, 930.);
        });

        state.update(cx, |state, cx| state.set_toolbox_width(400., cx));

        state.read_with(cx, |state, _| {
            assert_eq!(state.controller().max_allowable_width(), 840.);
            assert_eq!(state.geometry().width, 840.);
            assert!(state.geometry().wrap_enabled);
        });
    }

    #[gpui::test]
    fn test_code_editor_renders_in_window(cx: &mut TestAppContext) {
        let window = cx.update(|cx| {
            crate::init(cx);

            cx.open_window(Default::default(), |_window, cx| {
                cx.new(|cx| CodeEditorState::new(field("let a = 1;"), WorkspaceKind::Main, 0., cx))
            })
            .unwrap()
        });

        let mut visual_cx = VisualTestContext::from_window(window.into(), cx);
        visual_cx.run_until_parked();

        let state = window.root(cx).unwrap();
        state.read_with(cx, |state, _| {
            let geometry = state.geometry();
            assert!(geometry.width >= 500., "Panel should keep its minimum width");
            assert!(geometry.height >= 200., "Panel should keep its minimum height");
            assert!(!state.engine().visual_rows().is_empty());
        });
    }

    fn add_editor<'a>(
        cx: &'a mut TestAppContext,
        value: &str,
        workspace: WorkspaceKind,
    ) -> (Entity<CodeEditorState>, &'a mut VisualTestContext) {
        cx.update(crate::init);
        let value = value.to_owned();
        let (state, cx) = cx.add_window_view(move |_window, cx| {
            CodeEditorState::new(field(&value), workspace, 0., cx)
        });

        cx.update(|window, cx| {
            let focus_handle = state.read(cx).focus_handle.clone();
            focus_handle.focus(window, cx);
        });
        cx.run_until_parked();

        (state, cx)
    }

    #[gpui::test]
    fn test_typing_edits_and_widens_panel(cx: &mut TestAppContext) {
        let (state, cx) = add_editor(cx, "x", WorkspaceKind::Main);
        let before = state.read_with(cx, |state, _| state.geometry().width);

        cx.simulate_input(&"y".repeat(150));

        state.read_with(cx, |state, _| {
            assert_eq!(state.field().value(), format!("x{}", "y".repeat(150)));
            assert_eq!(state.cursor_offset(), 151, "Caret should follow typed text");
            assert!(
                state.geometry().width > before,
                "Panel should widen to fit the typed line"
            );
        });
    }

    #[gpui::test]
    fn test_keys_edit_text(cx: &mut TestAppContext) {
        let (state, cx) = add_editor(cx, "ab", WorkspaceKind::Main);

        cx.simulate_keystrokes("backspace enter");
        state.read_with(cx, |state, _| {
            assert_eq!(state.field().value(), "a\n");
        });

        cx.simulate_keystrokes("left left delete");
        state.read_with(cx, |state, _| {
            assert_eq!(state.field().value(), "\n");
            assert_eq!(state.cursor_offset(), 0);
        });
    }

    #[gpui::test]
    fn test_flyout_editor_ignores_input(cx: &mut TestAppContext) {
        let (state, cx) = add_editor(cx, "x", WorkspaceKind::Flyout);

        cx.simulate_input("abc");
        state.update_in(cx, |state, window, cx| {
            state.replace_text_in_range(None, "z", window, cx);
        });

        state.read_with(cx, |state, _| {
            assert!(!state.is_editable(), "Flyout editor should be read-only");
            assert_eq!(state.field().value(), "x");
            assert_eq!(state.cursor_offset(), 1);
            assert_eq!(state.geometry().width, 500.);
        });
    }
}

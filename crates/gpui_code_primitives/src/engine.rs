use std::ops::Range;
use std::rc::Rc;

use crate::document::DocumentSnapshot;

/// On-screen rectangle of a document position, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coords {
    /// Left edge in pixels.
    pub left: f32,
    /// Right edge in pixels.
    pub right: f32,
    /// Top edge in pixels.
    pub top: f32,
    /// Bottom edge in pixels.
    pub bottom: f32,
}

impl Coords {
    /// Width of the rectangle.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }
}

/// Notification emitted by an engine after a content or view change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutUpdate {
    /// The rendered geometry (sizes, wrap points, heights) may have changed.
    pub geometry_changed: bool,
    /// The document text changed.
    pub doc_changed: bool,
}

impl LayoutUpdate {
    /// A geometry-only notification.
    pub fn geometry() -> Self {
        Self {
            geometry_changed: true,
            doc_changed: false,
        }
    }

    /// Notification for an edit, which always implies a geometry change.
    pub fn edit() -> Self {
        Self {
            geometry_changed: true,
            doc_changed: true,
        }
    }
}

/// Callback invoked with every [`LayoutUpdate`].
pub type LayoutListener = Rc<dyn Fn(&LayoutUpdate)>;

/// Errors raised by editor engines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A user edit was attempted on a read-only editor.
    #[error("the editor is read-only")]
    ReadOnly,
    /// An edit range does not fit the document.
    #[error("edit range {start}..{end} is invalid for a document of {len} bytes")]
    InvalidRange {
        /// Start byte offset of the rejected range.
        start: usize,
        /// End byte offset of the rejected range.
        end: usize,
        /// Document length in bytes.
        len: usize,
    },
    /// The engine's view has been torn down.
    #[error("the editor view is detached")]
    Detached,
}

/// Fixed extension set an editor is created with.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSetup {
    /// Language mode used for tokenizing.
    pub language: String,
    /// Name of the editor theme.
    pub theme: String,
    /// Whether the user may edit the document.
    pub editable: bool,
    /// Anchor tooltips to the window overlay instead of the panel, so they are
    /// not clipped by the panel bounds.
    pub tooltips_in_overlay: bool,
    /// Initial value of the reconfigurable line-wrapping slot.
    pub line_wrapping: bool,
}

impl Default for EditorSetup {
    fn default() -> Self {
        Self {
            language: "javascript".into(),
            theme: "one_dark".into(),
            editable: true,
            tooltips_in_overlay: true,
            line_wrapping: false,
        }
    }
}

/// The text-editor engine as seen by the sizing logic.
///
/// Every method takes `&self`: coordinate queries may synchronously deliver
/// a [`LayoutUpdate`] to subscribers, which in turn query the engine again.
pub trait EditorEngine {
    /// The current document.
    fn snapshot(&self) -> DocumentSnapshot;

    /// The current document text.
    fn text(&self) -> String {
        self.snapshot().text().to_owned()
    }

    /// Screen rectangle of the character at byte offset `pos`, or `None` when
    /// that position is not currently rendered.
    fn coords_at_pos(&self, pos: usize) -> Option<Coords>;

    /// Rendered height of the content area.
    fn content_height(&self) -> f32;

    /// Sets the width the content area is laid out in, which is where
    /// wrapped rows break.
    fn set_viewport_width(&self, width: f32);

    /// Whether soft line wrapping is active.
    fn line_wrapping(&self) -> bool;

    /// Reconfigures the line-wrapping slot.
    fn set_line_wrapping(&self, enabled: bool) -> Result<(), EngineError>;

    /// Replaces the whole document.
    fn replace_text(&self, text: &str) -> Result<(), EngineError>;

    /// Applies a user edit, replacing `range` with `text`.
    fn apply_edit(&self, range: Range<usize>, text: &str) -> Result<(), EngineError>;

    /// Registers a layout-change listener.
    fn subscribe(&self, listener: LayoutListener);
}

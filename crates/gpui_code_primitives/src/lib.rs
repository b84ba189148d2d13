#![warn(missing_docs)]

//! Editor-engine primitives for auto-sizing code panels.

/// Line-addressed snapshots of the edited document.
pub mod document;

/// The editor-engine seam: coordinates, notifications and the engine trait.
pub mod engine;

/// A fixed-advance layout engine implementing [`engine::EditorEngine`].
pub mod layout;

/// Natural (unwrapped) line width estimation.
pub mod measure;

pub use document::{DocumentSnapshot, Line};
pub use engine::{Coords, EditorEngine, EditorSetup, EngineError, LayoutListener, LayoutUpdate};
pub use layout::MonospaceLayout;
pub use measure::{natural_line_width, rendered_sub_lines};

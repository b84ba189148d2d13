//! Seams between the code panel and the diagram editor hosting it.

use std::cell::Cell;

/// Pixel widths of the host workspace chrome the panel must leave room for.
pub trait WorkspaceMetrics {
    /// Width of the host's main container.
    fn available_width(&self) -> f32;

    /// Width of the toolbox docked beside the workspace.
    fn toolbox_width(&self) -> f32;
}

/// Metrics with constant values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedMetrics {
    pub available_width: f32,
    pub toolbox_width: f32,
}

impl WorkspaceMetrics for FixedMetrics {
    fn available_width(&self) -> f32 {
        self.available_width
    }

    fn toolbox_width(&self) -> f32 {
        self.toolbox_width
    }
}

/// Metrics that the host updates in place, e.g. on window resize.
#[derive(Debug, Default)]
pub struct SharedMetrics {
    available_width: Cell<f32>,
    toolbox_width: Cell<f32>,
}

impl SharedMetrics {
    pub fn new(available_width: f32, toolbox_width: f32) -> Self {
        Self {
            available_width: Cell::new(available_width),
            toolbox_width: Cell::new(toolbox_width),
        }
    }

    /// Returns true if the value changed.
    pub fn set_available_width(&self, width: f32) -> bool {
        self.available_width.replace(width) != width
    }

    /// Returns true if the value changed.
    pub fn set_toolbox_width(&self, width: f32) -> bool {
        self.toolbox_width.replace(width) != width
    }
}

impl WorkspaceMetrics for SharedMetrics {
    fn available_width(&self) -> f32 {
        self.available_width.get()
    }

    fn toolbox_width(&self) -> f32 {
        self.toolbox_width.get()
    }
}

/// Metrics read through a pair of accessor closures.
pub struct FnMetrics<A, T> {
    available_width: A,
    toolbox_width: T,
}

impl<A, T> FnMetrics<A, T>
where
    A: Fn() -> f32,
    T: Fn() -> f32,
{
    pub fn new(available_width: A, toolbox_width: T) -> Self {
        Self {
            available_width,
            toolbox_width,
        }
    }
}

impl<A, T> WorkspaceMetrics for FnMetrics<A, T>
where
    A: Fn() -> f32,
    T: Fn() -> f32,
{
    fn available_width(&self) -> f32 {
        (self.available_width)()
    }

    fn toolbox_width(&self) -> f32 {
        (self.toolbox_width)()
    }
}

/// The host field the panel is embedded in.
pub trait FieldHost {
    /// Asks the host to lay out and repaint the block holding the field.
    fn force_rerender(&self);
}

/// A [`FieldHost`] that records re-render requests for the caller to act on.
#[derive(Debug, Default)]
pub struct RerenderFlag {
    requested: Cell<bool>,
    count: Cell<usize>,
}

impl RerenderFlag {
    /// Returns whether a re-render was requested since the last call and
    /// clears the request.
    pub fn take(&self) -> bool {
        self.requested.replace(false)
    }

    /// Total number of requests received.
    pub fn count(&self) -> usize {
        self.count.get()
    }
}

impl FieldHost for RerenderFlag {
    fn force_rerender(&self) {
        self.requested.set(true);
        self.count.set(self.count.get() + 1);
    }
}

/// The kind of workspace a field lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkspaceKind {
    /// The main, editable workspace.
    #[default]
    Main,
    /// A toolbox flyout offering blocks to drag out. Fields here are read-only.
    Flyout,
}

impl WorkspaceKind {
    pub fn is_editable(self) -> bool {
        matches!(self, WorkspaceKind::Main)
    }
}

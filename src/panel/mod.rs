//! Auto-sizing of the panel that hosts a code editor.
//!
//! The panel grows to fit its widest line until it would take more than a
//! fixed share of the workspace, then it stops growing and turns on soft
//! wrapping instead. Sizing runs in response to the editor's layout-change
//! notifications, and measuring lines can itself provoke further
//! notifications, so each pass holds a reentry guard.

mod config;
pub use config::*;

use std::cell::Cell;
use std::rc::Rc;

use gpui_code_primitives::{EditorEngine, EngineError, LayoutUpdate, natural_line_width};

use crate::host::{FieldHost, WorkspaceMetrics};

/// Errors that abort a sizing pass. They are logged, never returned.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("could not reconfigure line wrapping: {0}")]
    Wrap(#[from] EngineError),
}

/// Outcome of handling one layout-change notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutPass {
    /// The notification carried no geometry change or arrived while another
    /// pass was running.
    Ignored,
    /// The panel was resized.
    Applied(PanelGeometry),
    /// The pass failed and the panel kept its previous size.
    Skipped,
}

/// Holds the reentry flag for the duration of a pass and clears it on every
/// exit path, unwinding included.
struct ReentryGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> ReentryGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self { flag })
    }
}

impl Drop for ReentryGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Keeps a panel's size and the editor's wrap mode in step with the content.
pub struct PanelController {
    engine: Rc<dyn EditorEngine>,
    metrics: Rc<dyn WorkspaceMetrics>,
    host: Rc<dyn FieldHost>,
    config: SizingConfig,
    geometry: Cell<PanelGeometry>,
    container: Cell<PanelContainer>,
    declared_size: Cell<PanelSize>,
    dirty: Cell<bool>,
    in_layout_pass: Cell<bool>,
}

impl PanelController {
    pub fn new(
        engine: Rc<dyn EditorEngine>,
        metrics: Rc<dyn WorkspaceMetrics>,
        host: Rc<dyn FieldHost>,
        config: SizingConfig,
    ) -> Self {
        let geometry = PanelGeometry {
            width: config.initial_width,
            height: config.initial_height,
            wrap_enabled: engine.line_wrapping(),
        };
        engine.set_viewport_width(config.initial_width - config.gutter_width);

        Self {
            engine,
            metrics,
            host,
            config,
            geometry: Cell::new(geometry),
            container: Cell::new(PanelContainer {
                width: config.initial_width,
                height: config.initial_height,
                min_width: config.initial_width,
                min_height: config.initial_height,
            }),
            declared_size: Cell::new(PanelSize {
                width: config.initial_width,
                height: config.initial_height,
            }),
            dirty: Cell::new(false),
            in_layout_pass: Cell::new(false),
        }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    pub fn geometry(&self) -> PanelGeometry {
        self.geometry.get()
    }

    /// Style currently applied to the embedding element.
    pub fn container(&self) -> PanelContainer {
        self.container.get()
    }

    /// Size the panel reports to the host block.
    pub fn declared_size(&self) -> PanelSize {
        self.declared_size.get()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Returns the dirty flag and clears it.
    pub fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }

    pub fn is_in_layout_pass(&self) -> bool {
        self.in_layout_pass.get()
    }

    /// Widest the panel may grow before it wraps instead.
    ///
    /// Read from the live host on every call.
    pub fn max_allowable_width(&self) -> f32 {
        (self.metrics.available_width() - self.metrics.toolbox_width())
            * self.config.wrap_multiplier
    }

    /// Handles a layout-change notification from the editor.
    pub fn on_layout_changed(&self, update: &LayoutUpdate) -> LayoutPass {
        if !update.geometry_changed {
            return LayoutPass::Ignored;
        }

        let Some(_guard) = ReentryGuard::acquire(&self.in_layout_pass) else {
            tracing::trace!("ignoring layout change raised during a sizing pass");
            return LayoutPass::Ignored;
        };

        match self.resize() {
            Ok(geometry) => LayoutPass::Applied(geometry),
            Err(err) => {
                tracing::warn!(%err, "panel sizing pass failed");
                LayoutPass::Skipped
            }
        }
    }

    /// Re-evaluates the panel after the host itself changed size.
    pub fn refresh(&self) -> LayoutPass {
        self.on_layout_changed(&LayoutUpdate::geometry())
    }

    fn resize(&self) -> Result<PanelGeometry, PanelError> {
        let current = self.geometry.get();
        let max_line_width = self.widest_line(current.wrap_enabled);

        let candidate_width =
            (max_line_width + self.config.gutter_width).max(self.config.initial_width);
        let max_allowable_width = self.max_allowable_width();
        let wrap_enabled = candidate_width > max_allowable_width;

        if wrap_enabled != current.wrap_enabled {
            tracing::debug!(
                wrap_enabled,
                candidate_width,
                max_allowable_width,
                "switching line wrapping"
            );
            self.engine.set_line_wrapping(wrap_enabled)?;
        }

        let width = if wrap_enabled {
            max_allowable_width.max(self.config.initial_width)
        } else {
            candidate_width
        };
        self.engine.set_viewport_width(width - self.config.gutter_width);
        let height = self.engine.content_height().max(self.config.initial_height);

        let geometry = PanelGeometry {
            width,
            height,
            wrap_enabled,
        };
        tracing::trace!(width, height, wrap_enabled, "applying panel size");
        self.apply(geometry);

        Ok(geometry)
    }

    fn widest_line(&self, wrap_enabled: bool) -> f32 {
        self.engine
            .snapshot()
            .lines()
            .map(|line| natural_line_width(self.engine.as_ref(), &line, wrap_enabled))
            .fold(0., f32::max)
    }

    fn apply(&self, geometry: PanelGeometry) {
        self.geometry.set(geometry);
        self.container.set(PanelContainer {
            width: geometry.width,
            height: geometry.height,
            ..self.container.get()
        });
        self.declared_size.set(PanelSize {
            width: geometry.width,
            height: geometry.height,
        });
        self.dirty.set(true);
        self.host.force_rerender();
    }
}

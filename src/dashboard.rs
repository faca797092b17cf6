//! Dashboard
//!
//! Ties the interaction pieces together: widgets laid out by the
//! `LayoutEngine`, dragged through the session zoom and snapped by the
//! `GridSnapController`, and driven by `DashboardAction`s bound to keys.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DashboardConfig;
use crate::context::Scope;
use crate::layout::{
    provide_zoom, GridSnapController, LayoutEngine, LayoutMode, Position, Size, SnapResult,
    Widget, ZoomController, ZoomError,
};
use crate::shortcuts::KeyboardShortcut;

/// Things a shortcut can ask the dashboard to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "mode", rename_all = "snake_case")]
pub enum DashboardAction {
    ToggleGridSnap,
    ToggleGuides,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    SetLayout(LayoutMode),
    SkipIntro,
}

/// Dashboard errors
#[derive(Error, Debug, PartialEq)]
pub enum DashboardError {
    #[error("Unknown widget: {0}")]
    UnknownWidget(String),

    #[error("Widget already exists: {0}")]
    DuplicateWidget(String),

    #[error("Zoom error: {0}")]
    Zoom(#[from] ZoomError),
}

/// Widgets plus the controllers that move them
pub struct Dashboard {
    widgets: Vec<Widget>,
    mode: LayoutMode,
    viewport: Size,
    engine: LayoutEngine,
    grid: GridSnapController,
    zoom: ZoomController,
}

impl Dashboard {
    /// Create the dashboard and become the session's zoom provider
    pub fn new(scope: &mut Scope, config: &DashboardConfig) -> Result<Self, DashboardError> {
        let zoom = provide_zoom(scope)?;

        Ok(Self {
            widgets: Vec::new(),
            mode: config.layout,
            viewport: Size::new(config.viewport_width, config.viewport_height),
            engine: LayoutEngine::new(),
            grid: GridSnapController::new(config.grid.clone()),
            zoom,
        })
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn grid(&self) -> &GridSnapController {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut GridSnapController {
        &mut self.grid
    }

    pub fn zoom(&self) -> &ZoomController {
        &self.zoom
    }

    /// Add a widget and place it with the current layout
    pub fn add_widget(&mut self, widget: Widget) -> Result<(), DashboardError> {
        if self.widget(&widget.id).is_some() {
            return Err(DashboardError::DuplicateWidget(widget.id));
        }
        self.widgets.push(widget);
        self.relayout();
        Ok(())
    }

    pub fn remove_widget(&mut self, id: &str) -> Option<Widget> {
        let index = self.widgets.iter().position(|w| w.id == id)?;
        let removed = self.widgets.remove(index);
        self.relayout();
        Some(removed)
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.relayout();
    }

    /// Switch arrangement. Unpins every widget so the new layout applies to all.
    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        tracing::info!(from = %self.mode, to = %mode, "Layout mode changed");
        self.mode = mode;
        for widget in &mut self.widgets {
            widget.pinned = false;
        }
        self.relayout();
    }

    /// Recompute positions of unpinned widgets
    pub fn relayout(&mut self) {
        let sizes: Vec<Size> = self.widgets.iter().map(|w| w.size).collect();
        let positions = self.engine.compute(self.mode, &sizes, self.viewport);

        for (widget, position) in self.widgets.iter_mut().zip(positions) {
            if !widget.pinned {
                widget.position = position;
            }
        }
    }

    /// Move a widget so its top-left corner sits under `screen` (screen
    /// space). The point is mapped through the zoom, snapped, and the widget
    /// is pinned there.
    pub fn drag_widget(&mut self, id: &str, screen: Position) -> Result<SnapResult, DashboardError> {
        let canvas = self.zoom.viewport().screen_to_canvas(screen);
        let snapped = self.grid.snap_to_grid(canvas);

        let widget = self
            .widgets
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| DashboardError::UnknownWidget(id.to_string()))?;

        widget.position = snapped.position();
        widget.pinned = true;

        tracing::trace!(widget = %id, position = %widget.position, "Widget dragged");
        Ok(snapped)
    }

    /// Apply an action. Returns `false` for actions the dashboard does not own
    /// (`SkipIntro` belongs to the intro sequencer).
    pub fn apply(&mut self, action: DashboardAction) -> bool {
        match action {
            DashboardAction::ToggleGridSnap => {
                let enabled = self.grid.toggle_grid_snap();
                tracing::info!(enabled, "Grid snap toggled");
            }
            DashboardAction::ToggleGuides => {
                let visible = self.grid.toggle_guides();
                tracing::info!(visible, "Grid guides toggled");
            }
            DashboardAction::ZoomIn => {
                self.zoom.zoom_in();
            }
            DashboardAction::ZoomOut => {
                self.zoom.zoom_out();
            }
            DashboardAction::ResetZoom => self.zoom.reset(),
            DashboardAction::SetLayout(mode) => self.set_layout_mode(mode),
            DashboardAction::SkipIntro => return false,
        }
        true
    }
}

/// Standard key bindings for the dashboard
pub fn default_shortcuts() -> Vec<KeyboardShortcut<DashboardAction>> {
    vec![
        KeyboardShortcut::new("g", DashboardAction::ToggleGridSnap, "Toggle grid snapping"),
        KeyboardShortcut::new("g", DashboardAction::ToggleGuides, "Toggle grid guides").shift(),
        KeyboardShortcut::new("=", DashboardAction::ZoomIn, "Zoom in").ctrl(),
        KeyboardShortcut::new("-", DashboardAction::ZoomOut, "Zoom out").ctrl(),
        KeyboardShortcut::new("0", DashboardAction::ResetZoom, "Reset zoom").ctrl(),
        KeyboardShortcut::new(
            "1",
            DashboardAction::SetLayout(LayoutMode::Orbital),
            "Orbital layout",
        ),
        KeyboardShortcut::new("2", DashboardAction::SetLayout(LayoutMode::Grid), "Grid layout"),
        KeyboardShortcut::new(
            "3",
            DashboardAction::SetLayout(LayoutMode::Masonry),
            "Masonry layout",
        ),
        KeyboardShortcut::new(
            "4",
            DashboardAction::SetLayout(LayoutMode::Spiral),
            "Spiral layout",
        ),
        KeyboardShortcut::new("Escape", DashboardAction::SkipIntro, "Skip intro"),
    ]
}

/// The widget set shown on a fresh dashboard
pub fn default_widgets() -> Vec<Widget> {
    vec![
        Widget::new("clock", "Clock", Size::new(240.0, 140.0)),
        Widget::new("calendar", "Calendar", Size::new(280.0, 220.0)),
        Widget::new("weather", "Weather", Size::new(220.0, 160.0)),
        Widget::new("tasks", "Tasks", Size::new(260.0, 240.0)),
        Widget::new("focus", "Focus Timer", Size::new(200.0, 200.0)),
        Widget::new("notes", "Notes", Size::new(260.0, 180.0)),
    ]
}

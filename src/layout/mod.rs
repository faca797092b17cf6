//! Dashboard Layout
//!
//! Interaction model of the dashboard canvas:
//!
//! - **types**: positions, sizes and widgets
//! - **grid**: grid snapping while dragging
//! - **zoom**: session viewport (scale/pan) shared through a `Scope`
//! - **engine**: arrangement strategies (orbital, grid, masonry, spiral)

mod engine;
mod grid;
mod types;
mod zoom;

pub use engine::{LayoutEngine, LayoutMode, LAYOUT_GAP, ORBIT_RADIUS_RATIO, SPIRAL_SPACING};
pub use grid::{
    GridConfig, GridSnapController, GuideLines, SnapResult, DEFAULT_CELL_SIZE,
    DEFAULT_SNAP_THRESHOLD,
};
pub use types::{Position, Rect, Size, Widget, WidgetId};
pub use zoom::{
    provide_zoom, try_use_zoom, use_zoom, Viewport, ZoomController, ZoomError, ZoomHandle,
    MAX_SCALE, MIN_SCALE, ZOOM_STEP,
};

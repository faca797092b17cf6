//! Grid Snapping
//!
//! Converts free-form cursor positions into grid-aligned positions while a
//! widget is being dragged. Each axis is snapped independently: a drag can
//! lock onto a vertical grid line while moving freely along Y.

use serde::{Deserialize, Serialize};

use super::types::{Position, Rect};

/// Default grid cell size in pixels
pub const DEFAULT_CELL_SIZE: f64 = 40.0;

/// Default snap threshold in pixels
pub const DEFAULT_SNAP_THRESHOLD: f64 = 20.0;

/// Grid preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Distance between grid lines, always > 0
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,
    /// Whether dragging snaps to the grid
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Whether grid guide lines are drawn
    #[serde(default)]
    pub show_guides: bool,
    /// Maximum distance (exclusive) from a grid line that still snaps
    #[serde(default = "default_snap_threshold")]
    pub snap_threshold: f64,
}

fn default_cell_size() -> f64 {
    DEFAULT_CELL_SIZE
}

fn default_enabled() -> bool {
    true
}

fn default_snap_threshold() -> f64 {
    DEFAULT_SNAP_THRESHOLD
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            enabled: true,
            show_guides: false,
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
        }
    }
}

/// Outcome of snapping a single position
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SnapResult {
    pub x: f64,
    pub y: f64,
    pub snapped_x: bool,
    pub snapped_y: bool,
}

impl SnapResult {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// True if either axis locked onto a grid line
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Grid lines visible inside a rectangle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuideLines {
    /// X coordinates of vertical lines
    pub vertical: Vec<f64>,
    /// Y coordinates of horizontal lines
    pub horizontal: Vec<f64>,
}

/// Owns the grid configuration and performs snapping
#[derive(Debug, Clone, Default)]
pub struct GridSnapController {
    config: GridConfig,
}

impl GridSnapController {
    pub fn new(config: GridConfig) -> Self {
        let cell_size = config.cell_size;
        let mut controller = Self {
            config: GridConfig {
                cell_size: DEFAULT_CELL_SIZE,
                ..config
            },
        };
        controller.set_cell_size(cell_size);
        controller
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn guides_visible(&self) -> bool {
        self.config.show_guides
    }

    pub fn cell_size(&self) -> f64 {
        self.config.cell_size
    }

    /// Snap a position to the grid.
    ///
    /// Disabled snapping returns the input untouched with both flags false.
    pub fn snap_to_grid(&self, position: Position) -> SnapResult {
        if !self.config.enabled {
            return SnapResult {
                x: position.x,
                y: position.y,
                snapped_x: false,
                snapped_y: false,
            };
        }

        let (x, snapped_x) = self.snap_axis(position.x);
        let (y, snapped_y) = self.snap_axis(position.y);

        SnapResult {
            x,
            y,
            snapped_x,
            snapped_y,
        }
    }

    fn snap_axis(&self, value: f64) -> (f64, bool) {
        let cell = self.config.cell_size;
        let nearest = (value / cell).round() * cell;

        if (value - nearest).abs() < self.config.snap_threshold {
            (nearest, true)
        } else {
            (value, false)
        }
    }

    /// Flip snapping on or off, returning the new state
    pub fn toggle_grid_snap(&mut self) -> bool {
        self.config.enabled = !self.config.enabled;
        self.config.enabled
    }

    /// Flip guide visibility, returning the new state
    pub fn toggle_guides(&mut self) -> bool {
        self.config.show_guides = !self.config.show_guides;
        self.config.show_guides
    }

    /// Change the cell size. Non-finite or non-positive sizes are ignored.
    pub fn set_cell_size(&mut self, cell_size: f64) {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            tracing::warn!(cell_size, "Ignoring invalid grid cell size");
            return;
        }
        self.config.cell_size = cell_size;
    }

    /// Grid lines that fall inside `area`. Empty while guides are hidden.
    pub fn guide_lines(&self, area: Rect) -> GuideLines {
        if !self.config.show_guides {
            return GuideLines::default();
        }

        let cell = self.config.cell_size;
        GuideLines {
            vertical: lines_between(area.min_x(), area.max_x(), cell),
            horizontal: lines_between(area.min_y(), area.max_y(), cell),
        }
    }
}

/// Upper bound on guide lines per axis. Denser grids show every n-th line.
pub const MAX_GUIDE_LINES: usize = 512;

fn lines_between(min: f64, max: f64, cell: f64) -> Vec<f64> {
    let first = (min / cell).ceil();
    let last = (max / cell).floor();
    if !first.is_finite() || !last.is_finite() || last < first {
        return Vec::new();
    }

    let count = last - first + 1.0;
    let stride = (count / MAX_GUIDE_LINES as f64).ceil().max(1.0);

    // Align to the stride so thinned lines stay put while panning
    let mut index = (first / stride).ceil() * stride;
    let mut lines = Vec::new();
    while index <= last && lines.len() < MAX_GUIDE_LINES {
        lines.push(index * cell);
        index += stride;
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::Size;

    fn controller() -> GridSnapController {
        GridSnapController::new(GridConfig::default())
    }

    #[test]
    fn test_on_grid_line_snaps_to_itself() {
        let grid = controller();
        for (x, y) in [(0.0, 0.0), (80.0, 120.0), (-40.0, 400.0)] {
            let result = grid.snap_to_grid(Position::new(x, y));
            assert_eq!((result.x, result.y), (x, y));
            assert!(result.snapped_x && result.snapped_y);
        }
    }

    #[test]
    fn test_threshold_boundary_is_exclusive() {
        let grid = controller();

        let result = grid.snap_to_grid(Position::new(60.0, 100.0));
        assert!(!result.snapped_x);
        assert!(!result.snapped_y);
        assert_eq!(result.position(), Position::new(60.0, 100.0));

        let result = grid.snap_to_grid(Position::new(59.9, 100.1));
        assert!(result.snapped_x);
        assert!(result.snapped_y);
        assert_eq!(result.position(), Position::new(40.0, 120.0));
    }

    #[test]
    fn test_axes_snap_independently() {
        let grid = controller();
        let result = grid.snap_to_grid(Position::new(82.0, 140.0));
        assert!(result.snapped_x);
        assert!(!result.snapped_y);
        assert_eq!(result.x, 80.0);
        assert_eq!(result.y, 140.0);
    }

    #[test]
    fn test_negative_coordinates() {
        let grid = controller();
        let result = grid.snap_to_grid(Position::new(-41.5, -5.0));
        assert_eq!(result.x, -40.0);
        assert_eq!(result.y, 0.0);
    }

    #[test]
    fn test_threshold_independent_of_cell_size() {
        let grid = GridSnapController::new(GridConfig {
            cell_size: 100.0,
            ..GridConfig::default()
        });

        let result = grid.snap_to_grid(Position::new(30.0, 30.0));
        assert!(!result.snapped_x);
        assert!(!result.snapped_y);

        let result = grid.snap_to_grid(Position::new(119.9, 70.0));
        assert!(result.snapped_x);
        assert!(!result.snapped_y);
        assert_eq!(result.position(), Position::new(100.0, 70.0));
    }

    #[test]
    fn test_disabled_is_identity() {
        let mut grid = controller();
        assert!(!grid.toggle_grid_snap());

        for (x, y) in [(0.0, 0.0), (59.9, 100.1), (-13.37, 4242.0), (40.0, 40.0)] {
            let result = grid.snap_to_grid(Position::new(x, y));
            assert_eq!((result.x, result.y), (x, y));
            assert!(!result.snapped_x);
            assert!(!result.snapped_y);
        }
    }

    #[test]
    fn test_set_cell_size_rejects_invalid() {
        let mut grid = controller();
        grid.set_cell_size(0.0);
        grid.set_cell_size(-10.0);
        grid.set_cell_size(f64::NAN);
        assert_eq!(grid.cell_size(), DEFAULT_CELL_SIZE);

        grid.set_cell_size(25.0);
        assert_eq!(grid.cell_size(), 25.0);
    }

    #[test]
    fn test_guide_lines() {
        let mut grid = controller();
        let area = Rect::new(Position::new(-10.0, 0.0), Size::new(100.0, 80.0));
        assert_eq!(grid.guide_lines(area), GuideLines::default());

        grid.toggle_guides();
        let lines = grid.guide_lines(area);
        assert_eq!(lines.vertical, vec![0.0, 40.0, 80.0]);
        assert_eq!(lines.horizontal, vec![0.0, 40.0, 80.0]);
    }

    #[test]
    fn test_guide_lines_capped() {
        let mut grid = controller();
        grid.set_cell_size(1.0);
        grid.toggle_guides();

        let area = Rect::new(Position::ORIGIN, Size::new(1.0e9, 10.0));
        let lines = grid.guide_lines(area);
        assert!(!lines.vertical.is_empty());
        assert!(lines.vertical.len() <= MAX_GUIDE_LINES);
        assert!(lines.vertical.iter().all(|x| x.fract() == 0.0));
        assert_eq!(lines.horizontal.len(), 11);
    }
}

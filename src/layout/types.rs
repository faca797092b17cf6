//! Core geometry types for the dashboard canvas
//!
//! - `Position`: a point in canvas space (pixels)
//! - `Size`: width/height of a widget or viewport
//! - `Rect`: an axis-aligned rectangle, used for visible-area queries
//! - `Widget`: a draggable dashboard tile

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in canvas space, in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by the given offsets
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Euclidean distance to another point
    pub fn distance_to(self, other: Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Width and height in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Centre point of a box of this size anchored at the origin
    pub fn center(self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Axis-aligned rectangle in canvas space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Position,
    pub size: Size,
}

impl Rect {
    pub fn new(origin: Position, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.min_x()
            && point.x <= self.max_x()
            && point.y >= self.min_y()
            && point.y <= self.max_y()
    }
}

/// Identifier for a widget on the dashboard
pub type WidgetId = String;

/// A draggable tile on the dashboard canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    /// Stable identifier ("clock", "weather", ...)
    pub id: WidgetId,
    /// Display title
    pub title: String,
    /// Rendered size
    pub size: Size,
    /// Top-left corner in canvas space
    #[serde(default)]
    pub position: Position,
    /// Set once the user drags the widget; layout passes leave pinned widgets alone
    #[serde(default)]
    pub pinned: bool,
}

impl Widget {
    /// Create a widget of the given size at the origin
    pub fn new(id: impl Into<WidgetId>, title: impl Into<String>, size: Size) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            size,
            position: Position::ORIGIN,
            pinned: false,
        }
    }

    /// Bounding rectangle in canvas space
    pub fn bounds(&self) -> Rect {
        Rect::new(self.position, self.size)
    }
}

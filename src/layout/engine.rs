//! Layout Engine
//!
//! Computes widget positions for the named arrangement strategies. All
//! strategies are pure functions of the widget sizes and the viewport size,
//! return one top-left position per widget in input order, and are
//! deterministic.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use super::types::{Position, Size};

/// Gap between neighbouring widgets in grid and masonry layouts
pub const LAYOUT_GAP: f64 = 24.0;

/// Orbit radius as a fraction of the shorter viewport side
pub const ORBIT_RADIUS_RATIO: f64 = 0.35;

/// Radial spacing between consecutive spiral slots
pub const SPIRAL_SPACING: f64 = 90.0;

/// Golden angle in radians (~137.5 degrees)
const GOLDEN_ANGLE: f64 = PI * (3.0 - 2.236_067_977_499_79);

/// Named arrangement strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Orbital,
    Grid,
    Masonry,
    Spiral,
}

impl LayoutMode {
    pub const ALL: [LayoutMode; 4] = [
        LayoutMode::Orbital,
        LayoutMode::Grid,
        LayoutMode::Masonry,
        LayoutMode::Spiral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Orbital => "orbital",
            LayoutMode::Grid => "grid",
            LayoutMode::Masonry => "masonry",
            LayoutMode::Spiral => "spiral",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "orbital" => Ok(LayoutMode::Orbital),
            "grid" => Ok(LayoutMode::Grid),
            "masonry" => Ok(LayoutMode::Masonry),
            "spiral" => Ok(LayoutMode::Spiral),
            other => Err(format!("unknown layout mode: {}", other)),
        }
    }
}

/// Stateless position calculator for the layout modes
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine;

impl LayoutEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute top-left positions for `sizes` within `viewport`
    pub fn compute(&self, mode: LayoutMode, sizes: &[Size], viewport: Size) -> Vec<Position> {
        if sizes.is_empty() {
            return Vec::new();
        }

        match mode {
            LayoutMode::Orbital => orbital(sizes, viewport),
            LayoutMode::Grid => grid(sizes, viewport),
            LayoutMode::Masonry => masonry(sizes, viewport),
            LayoutMode::Spiral => spiral(sizes, viewport),
        }
    }
}

fn top_left_of(center: Position, size: Size) -> Position {
    Position::new(center.x - size.width / 2.0, center.y - size.height / 2.0)
}

fn orbital(sizes: &[Size], viewport: Size) -> Vec<Position> {
    let center = viewport.center();

    if sizes.len() == 1 {
        return vec![top_left_of(center, sizes[0])];
    }

    let radius = viewport.width.min(viewport.height) * ORBIT_RADIUS_RATIO;
    let step = 2.0 * PI / sizes.len() as f64;

    sizes
        .iter()
        .enumerate()
        .map(|(i, size)| {
            // Start at 12 o'clock
            let angle = -PI / 2.0 + step * i as f64;
            let slot = Position::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            );
            top_left_of(slot, *size)
        })
        .collect()
}

fn grid(sizes: &[Size], viewport: Size) -> Vec<Position> {
    let count = sizes.len();
    let columns = (count as f64).sqrt().ceil() as usize;
    let rows = count.div_ceil(columns);

    let cell_w = sizes.iter().map(|s| s.width).fold(0.0, f64::max) + LAYOUT_GAP;
    let cell_h = sizes.iter().map(|s| s.height).fold(0.0, f64::max) + LAYOUT_GAP;

    let total_w = columns as f64 * cell_w - LAYOUT_GAP;
    let total_h = rows as f64 * cell_h - LAYOUT_GAP;
    let origin_x = (viewport.width - total_w) / 2.0;
    let origin_y = (viewport.height - total_h) / 2.0;

    (0..count)
        .map(|i| {
            let col = i % columns;
            let row = i / columns;
            Position::new(
                origin_x + col as f64 * cell_w,
                origin_y + row as f64 * cell_h,
            )
        })
        .collect()
}

fn masonry(sizes: &[Size], viewport: Size) -> Vec<Position> {
    let column_w = sizes.iter().map(|s| s.width).fold(0.0, f64::max) + LAYOUT_GAP;
    let fit = ((viewport.width + LAYOUT_GAP) / column_w).floor() as usize;
    let columns = fit.clamp(1, sizes.len());

    let total_w = columns as f64 * column_w - LAYOUT_GAP;
    let origin_x = ((viewport.width - total_w) / 2.0).max(0.0);

    let mut heights = vec![LAYOUT_GAP; columns];

    sizes
        .iter()
        .map(|size| {
            // First shortest column wins ties
            let (col, top) = heights
                .iter()
                .copied()
                .enumerate()
                .fold((0, f64::INFINITY), |best, (i, h)| {
                    if h < best.1 {
                        (i, h)
                    } else {
                        best
                    }
                });

            heights[col] = top + size.height + LAYOUT_GAP;
            Position::new(origin_x + col as f64 * column_w, top)
        })
        .collect()
}

fn spiral(sizes: &[Size], viewport: Size) -> Vec<Position> {
    let center = viewport.center();

    sizes
        .iter()
        .enumerate()
        .map(|(i, size)| {
            let radius = SPIRAL_SPACING * (i as f64).sqrt();
            let angle = i as f64 * GOLDEN_ANGLE;
            let slot = Position::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            );
            top_left_of(slot, *size)
        })
        .collect()
}

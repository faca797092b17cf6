//! Viewport Zoom & Pan
//!
//! One `ZoomController` exists per session. It is created by `provide_zoom`,
//! which also publishes a read-only `ZoomHandle` into the session `Scope`.
//! Widgets obtain handles through `use_zoom` and never create their own
//! controller. The controller is the single writer; handles observe changes
//! through a `tokio::sync::watch` channel.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use super::types::Position;
use crate::context::Scope;

/// Smallest allowed scale factor
pub const MIN_SCALE: f64 = 0.25;

/// Largest allowed scale factor
pub const MAX_SCALE: f64 = 3.0;

/// Multiplicative step used by `zoom_in` / `zoom_out`
pub const ZOOM_STEP: f64 = 1.1;

/// Scale and pan offset of the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl Viewport {
    /// Map a screen-space point into canvas space
    pub fn screen_to_canvas(&self, screen: Position) -> Position {
        Position::new(
            (screen.x - self.pan_x) / self.scale,
            (screen.y - self.pan_y) / self.scale,
        )
    }

    /// Map a canvas-space point onto the screen
    pub fn canvas_to_screen(&self, canvas: Position) -> Position {
        Position::new(
            canvas.x * self.scale + self.pan_x,
            canvas.y * self.scale + self.pan_y,
        )
    }

    /// Scale as a whole percentage, for display
    pub fn percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }
}

/// Errors raised when wiring the zoom context
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ZoomError {
    #[error("use_zoom must be called inside a scope that has a zoom provider")]
    NotProvided,

    #[error("a zoom controller has already been provided for this scope")]
    AlreadyProvided,
}

/// Writer side of the session viewport
#[derive(Debug)]
pub struct ZoomController {
    tx: watch::Sender<Viewport>,
}

/// Read-only view of the session viewport
#[derive(Debug, Clone)]
pub struct ZoomHandle {
    rx: watch::Receiver<Viewport>,
}

/// Create the session's zoom controller and publish a handle in `scope`
pub fn provide_zoom(scope: &mut Scope) -> Result<ZoomController, ZoomError> {
    if scope.contains::<ZoomHandle>() {
        return Err(ZoomError::AlreadyProvided);
    }

    let controller = ZoomController::new();
    scope.provide(controller.handle());
    tracing::debug!("Zoom controller provided");
    Ok(controller)
}

/// Fetch the session zoom handle, or `ZoomError::NotProvided`
pub fn try_use_zoom(scope: &Scope) -> Result<ZoomHandle, ZoomError> {
    scope.use_context::<ZoomHandle>().ok_or(ZoomError::NotProvided)
}

/// Fetch the session zoom handle.
///
/// # Panics
///
/// Panics when no `provide_zoom` call has run for `scope`.
pub fn use_zoom(scope: &Scope) -> ZoomHandle {
    match try_use_zoom(scope) {
        Ok(handle) => handle,
        Err(e) => panic!("{}", e),
    }
}

impl ZoomController {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(Viewport::default());
        Self { tx }
    }

    /// A new read handle onto this controller's viewport
    pub fn handle(&self) -> ZoomHandle {
        ZoomHandle {
            rx: self.tx.subscribe(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        *self.tx.borrow()
    }

    pub fn scale(&self) -> f64 {
        self.tx.borrow().scale
    }

    pub fn zoom_in(&self) -> f64 {
        self.set_scale(self.scale() * ZOOM_STEP)
    }

    pub fn zoom_out(&self) -> f64 {
        self.set_scale(self.scale() / ZOOM_STEP)
    }

    /// Set the scale (clamped), keeping the pan offset. Returns the applied scale.
    pub fn set_scale(&self, scale: f64) -> f64 {
        let scale = clamp_scale(scale);
        self.tx.send_if_modified(|viewport| {
            if viewport.scale == scale {
                return false;
            }
            viewport.scale = scale;
            true
        });
        self.scale()
    }

    /// Zoom by `factor` keeping the canvas point under `anchor` (screen space)
    /// fixed on screen.
    pub fn zoom_at(&self, anchor: Position, factor: f64) -> f64 {
        self.tx.send_if_modified(|viewport| {
            let scale = clamp_scale(viewport.scale * factor);
            if scale == viewport.scale {
                return false;
            }
            let canvas_point = viewport.screen_to_canvas(anchor);
            viewport.scale = scale;
            viewport.pan_x = anchor.x - canvas_point.x * scale;
            viewport.pan_y = anchor.y - canvas_point.y * scale;
            true
        });
        self.scale()
    }

    /// Pan by a screen-space delta
    pub fn pan_by(&self, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.tx.send_modify(|viewport| {
            viewport.pan_x += dx;
            viewport.pan_y += dy;
        });
    }

    /// Back to 100% with no pan
    pub fn reset(&self) {
        self.tx.send_if_modified(|viewport| {
            if *viewport == Viewport::default() {
                return false;
            }
            *viewport = Viewport::default();
            true
        });
    }
}

impl ZoomHandle {
    pub fn viewport(&self) -> Viewport {
        *self.rx.borrow()
    }

    pub fn scale(&self) -> f64 {
        self.rx.borrow().scale
    }

    pub fn screen_to_canvas(&self, screen: Position) -> Position {
        self.rx.borrow().screen_to_canvas(screen)
    }

    /// Wait for the next viewport change. Returns `None` once the controller is gone.
    pub async fn changed(&mut self) -> Option<Viewport> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provide_then_use() {
        let mut scope = Scope::new();
        let controller = provide_zoom(&mut scope).unwrap();
        let handle = use_zoom(&scope);

        controller.zoom_in();
        assert!((handle.scale() - ZOOM_STEP).abs() < 1e-9);
    }

    #[test]
    fn test_use_without_provider() {
        let scope = Scope::new();
        assert_eq!(try_use_zoom(&scope).unwrap_err(), ZoomError::NotProvided);
    }

    #[test]
    #[should_panic(expected = "zoom provider")]
    fn test_use_zoom_panics_without_provider() {
        let scope = Scope::new();
        let _ = use_zoom(&scope);
    }

    #[test]
    fn test_provide_twice_fails() {
        let mut scope = Scope::new();
        let _controller = provide_zoom(&mut scope).unwrap();
        assert_eq!(
            provide_zoom(&mut scope).unwrap_err(),
            ZoomError::AlreadyProvided
        );
    }

    #[test]
    fn test_scale_is_clamped() {
        let mut scope = Scope::new();
        let controller = provide_zoom(&mut scope).unwrap();

        assert_eq!(controller.set_scale(10.0), MAX_SCALE);
        assert_eq!(controller.set_scale(0.01), MIN_SCALE);
        assert_eq!(controller.set_scale(f64::NAN), 1.0);

        for _ in 0..100 {
            controller.zoom_out();
        }
        assert_eq!(controller.scale(), MIN_SCALE);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut scope = Scope::new();
        let controller = provide_zoom(&mut scope).unwrap();
        controller.pan_by(30.0, -20.0);

        let anchor = Position::new(400.0, 300.0);
        let before = controller.viewport().screen_to_canvas(anchor);
        controller.zoom_at(anchor, 2.0);
        let after = controller.viewport().screen_to_canvas(anchor);

        assert_eq!(controller.scale(), 2.0);
        assert!(before.distance_to(after) < 1e-9);
    }

    #[test]
    fn test_coordinate_round_trip() {
        let viewport = Viewport {
            scale: 1.5,
            pan_x: 100.0,
            pan_y: 50.0,
        };
        let canvas = Position::new(40.0, 80.0);
        let screen = viewport.canvas_to_screen(canvas);
        assert_eq!(screen, Position::new(160.0, 170.0));
        assert_eq!(viewport.screen_to_canvas(screen), canvas);
    }

    #[test]
    fn test_reset() {
        let mut scope = Scope::new();
        let controller = provide_zoom(&mut scope).unwrap();
        controller.zoom_in();
        controller.pan_by(10.0, 10.0);
        controller.reset();
        assert_eq!(controller.viewport(), Viewport::default());
    }

    #[tokio::test]
    async fn test_handle_observes_changes() {
        let mut scope = Scope::new();
        let controller = provide_zoom(&mut scope).unwrap();
        let mut handle = use_zoom(&scope);

        controller.pan_by(5.0, 0.0);
        let viewport = handle.changed().await.unwrap();
        assert_eq!(viewport.pan_x, 5.0);

        drop(controller);
        assert!(handle.changed().await.is_none());
    }
}

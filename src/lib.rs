//! # Chrona
//!
//! Personal dashboard for students: a free-form canvas of widgets with grid
//! snapping, zoom, layout modes, keyboard shortcuts and an intro sequence,
//! plus the Scholarly server that proxies Canvas LMS and guards the
//! dashboard behind a session.
//!
//! ## Modules
//!
//! - [`layout`]: Geometry, grid snapping, zoom and layout engines
//! - [`shortcuts`]: Keyboard shortcut matching and listener lifetime
//! - [`intro`]: Timed intro phases with skip
//! - [`dashboard`]: Widgets and the actions shortcuts drive
//! - [`context`]: Scoped context for sharing controllers
//! - [`canvas`]: Canvas LMS client
//! - [`auth`]: Sessions, sign-in providers and the route policy
//! - [`profile`]: Persisted signed-in profile
//! - [`api`]: HTTP server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrona::context::Scope;
//! use chrona::config::DashboardConfig;
//! use chrona::dashboard::{default_widgets, Dashboard};
//! use chrona::layout::Position;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut scope = Scope::new();
//!     let mut dashboard = Dashboard::new(&mut scope, &DashboardConfig::default())?;
//!
//!     for widget in default_widgets() {
//!         dashboard.add_widget(widget)?;
//!     }
//!
//!     // Drop the clock near a grid intersection
//!     let snap = dashboard.drag_widget("clock", Position::new(118.0, 83.0))?;
//!     println!("clock at {}", snap.position());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod canvas;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod intro;
pub mod layout;
pub mod profile;
pub mod shortcuts;

// Re-export top-level types for convenience
pub use layout::{
    GridConfig, GridSnapController, LayoutEngine, LayoutMode, Position, Rect, Size, SnapResult,
    Viewport, Widget, ZoomController, ZoomError, ZoomHandle,
};

pub use shortcuts::{
    KeyEvent, KeyEventSource, KeyboardShortcut, ListenerGuard, Modifiers, ShortcutBinding,
    ShortcutDispatcher,
};

pub use intro::{IntroConfig, IntroPhase, IntroSequencer, IntroState};

pub use dashboard::{Dashboard, DashboardAction, DashboardError};

pub use canvas::{CanvasClient, CanvasConfig, CanvasError};

pub use auth::{AuthError, IdentityProvider, RoutePolicy, SessionStore};

pub use profile::{ProfileStore, UserProfile};

pub use api::{build_router, serve, ApiError, AppState, CanvasBackend};

pub use config::{Config, ConfigError, LoggingConfig};

//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::time::Instant;

use crate::auth::{IdentityProvider, RoutePolicy, SessionStore};
use crate::canvas::{CanvasClient, CanvasConfig};
use crate::config::{ApiConfig, AuthConfig};

/// The Canvas upstream, if the server could be configured for it
pub enum CanvasBackend {
    Ready(CanvasClient),
    /// Settings were missing at startup; every proxy request fails with this
    /// message and never leaves the process.
    Unconfigured(String),
}

impl CanvasBackend {
    /// Build a client from resolved settings, or record why there is none
    pub fn from_config(config: Result<CanvasConfig, impl std::fmt::Display>) -> Self {
        match config {
            Ok(config) => match CanvasClient::new(config) {
                Ok(client) => CanvasBackend::Ready(client),
                Err(e) => CanvasBackend::Unconfigured(format!("Canvas client unavailable: {}", e)),
            },
            Err(e) => CanvasBackend::Unconfigured(format!("Canvas is not configured: {}", e)),
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, CanvasBackend::Ready(_))
    }
}

/// Shared application state for all handlers
pub struct AppState {
    /// Canvas upstream
    pub canvas: CanvasBackend,
    /// Live sessions and pending sign-ins
    pub sessions: SessionStore,
    /// Sign-in provider; `None` when sign-in is disabled
    pub provider: Option<Box<dyn IdentityProvider>>,
    /// Route guard rules
    pub policy: RoutePolicy,
    /// Auth settings
    pub auth: AuthConfig,
    /// API configuration
    pub config: ApiConfig,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create state with sign-in disabled
    pub fn new(canvas: CanvasBackend, auth: AuthConfig, config: ApiConfig) -> Self {
        Self {
            canvas,
            sessions: SessionStore::new(auth.session_ttl_minutes),
            provider: None,
            policy: RoutePolicy::new(auth.landing_path.clone()),
            auth,
            config,
            start_time: Instant::now(),
        }
    }

    /// Attach a sign-in provider
    pub fn with_provider(mut self, provider: Option<Box<dyn IdentityProvider>>) -> Self {
        self.provider = provider;
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

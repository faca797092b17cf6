//! Authentication
//!
//! Sessions, sign-in providers and the path-based route policy guarding the
//! dashboard.

mod policy;
mod provider;
mod session;

pub use policy::{callback_from_query, sanitize_callback, RouteDecision, RoutePolicy};
pub use provider::{build_provider, IdentityProvider, MockIdentityProvider};
pub use session::{
    clear_session_cookie, session_cookie, token_from_cookie_header, Session, SessionStore,
    MAX_SESSION_TTL_MINUTES, SESSION_COOKIE,
};

use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Sign-in is not enabled")]
    ProviderDisabled,

    #[error("Mock sign-in is only available in development")]
    MockOutsideDevelopment,

    #[error("Authorization code was rejected")]
    InvalidCode,

    #[error("Sign-in state is unknown or expired")]
    InvalidState,
}

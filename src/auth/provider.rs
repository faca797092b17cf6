//! Identity Providers
//!
//! An identity provider turns an authorization code from the sign-in redirect
//! into a `UserProfile`. Only the mock provider ships here; it must be wired
//! through `build_provider`, which refuses it outside development.

use async_trait::async_trait;
use chrono::Utc;

use super::AuthError;
use crate::config::{AuthConfig, AuthProviderKind, Environment};
use crate::profile::UserProfile;

/// Common trait for sign-in providers
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short provider name, stored on the profile
    fn name(&self) -> &str;

    /// Where to send the browser to start signing in. The provider must
    /// eventually redirect to `redirect_uri` with `code` and `state`.
    fn authorize_url(&self, redirect_uri: &str, state: &str) -> String;

    /// Exchange an authorization code for the user's profile
    async fn exchange_code(&self, code: &str) -> Result<UserProfile, AuthError>;
}

const MOCK_CODE_PREFIX: &str = "mock-";

/// Signs everyone in as the same demo student, without a round trip
#[derive(Debug)]
pub struct MockIdentityProvider {
    _private: (),
}

impl MockIdentityProvider {
    fn new() -> Self {
        Self { _private: () }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        let code = format!("{}{}", MOCK_CODE_PREFIX, uuid::Uuid::new_v4());
        format!(
            "{}?code={}&state={}",
            redirect_uri,
            urlencoding::encode(&code),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<UserProfile, AuthError> {
        if !code.starts_with(MOCK_CODE_PREFIX) {
            return Err(AuthError::InvalidCode);
        }

        Ok(UserProfile {
            id: "mock-student".to_string(),
            name: "Demo Student".to_string(),
            email: "demo.student@example.edu".to_string(),
            avatar_url: None,
            provider: self.name().to_string(),
            signed_in_at: Utc::now(),
        })
    }
}

/// Build the configured provider. `Ok(None)` means sign-in is disabled.
///
/// The mock provider is refused unless the environment is development, so a
/// staging or production process cannot reach it whatever else is set.
pub fn build_provider(config: &AuthConfig) -> Result<Option<Box<dyn IdentityProvider>>, AuthError> {
    match config.provider {
        AuthProviderKind::Disabled => Ok(None),
        AuthProviderKind::Mock => {
            if config.environment != Environment::Development {
                return Err(AuthError::MockOutsideDevelopment);
            }
            tracing::warn!("Mock identity provider enabled: every sign-in is the demo student");
            Ok(Some(Box::new(MockIdentityProvider::new())))
        }
    }
}

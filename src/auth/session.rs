//! Session Store
//!
//! In-memory sessions keyed by an opaque token, plus the one-time OAuth
//! `state` values issued when a sign-in starts.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::profile::UserProfile;

/// Cookie that carries the session token
pub const SESSION_COOKIE: &str = "scholarly_session";

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_TTL_MINUTES: i64 = 525_600;

/// Lifetime of a pending sign-in
const PENDING_TTL_MINUTES: i64 = 10;

/// An authenticated session
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    #[serde(skip)]
    pub token: String,
    pub profile: UserProfile,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A sign-in that has been started but not completed
#[derive(Debug, Clone)]
struct PendingSignIn {
    callback_url: Option<String>,
    expires_at: DateTime<Utc>,
}

/// Shared session storage
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    pending: Arc<RwLock<HashMap<String, PendingSignIn>>>,
    ttl: Duration,
}

impl SessionStore {
    /// Lifetime is clamped to `0..=MAX_SESSION_TTL_MINUTES`
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            pending: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::minutes(ttl_minutes.clamp(0, MAX_SESSION_TTL_MINUTES)),
        }
    }

    /// Open a session for `profile`. Expired sessions are swept first.
    pub async fn create(&self, profile: UserProfile) -> Session {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().to_string(),
            profile,
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(now),
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        if sessions.len() < before {
            tracing::debug!(removed = before - sessions.len(), "Expired sessions pruned");
        }
        sessions.insert(session.token.clone(), session.clone());
        drop(sessions);

        tracing::info!(user = %session.profile.id, "Session created");
        session
    }

    /// Look up a live session. Expired sessions are dropped.
    pub async fn get(&self, token: &str) -> Option<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(session) if !session.is_expired(now) => return Some(session.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.sessions.write().await.remove(token);
        tracing::debug!("Expired session removed");
        None
    }

    /// End a session. Returns whether one existed.
    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Start a sign-in, returning the one-time `state` value
    pub async fn begin_sign_in(&self, callback_url: Option<String>) -> String {
        let state = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut pending = self.pending.write().await;
        pending.retain(|_, p| p.expires_at > now);
        pending.insert(
            state.clone(),
            PendingSignIn {
                callback_url,
                expires_at: now + Duration::minutes(PENDING_TTL_MINUTES),
            },
        );

        state
    }

    /// Consume a `state` value. `None` if unknown, reused or expired;
    /// otherwise the callback URL recorded at the start (if any).
    pub async fn finish_sign_in(&self, state: &str) -> Option<Option<String>> {
        let pending = self.pending.write().await.remove(state)?;
        if pending.expires_at <= Utc::now() {
            return None;
        }
        Some(pending.callback_url)
    }
}

/// Extract the session token from a `Cookie` header value
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value for a fresh session
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that clears the session
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            id: "u1".into(),
            name: "Student".into(),
            email: "s@example.edu".into(),
            avatar_url: None,
            provider: "mock".into(),
            signed_in_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_get_revoke() {
        let store = SessionStore::new(60);
        let session = store.create(profile()).await;

        let found = store.get(&session.token).await.unwrap();
        assert_eq!(found.profile.id, "u1");

        assert!(store.revoke(&session.token).await);
        assert!(store.get(&session.token).await.is_none());
        assert!(!store.revoke(&session.token).await);
    }

    #[tokio::test]
    async fn test_expired_session_dropped() {
        let store = SessionStore::new(0);
        let session = store.create(profile()).await;
        assert!(store.get(&session.token).await.is_none());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_prunes_expired() {
        let store = SessionStore::new(0);
        for _ in 0..1000 {
            store.create(profile()).await;
        }
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_oversized_ttl_clamped() {
        let store = SessionStore::new(140_000_000_000);
        let session = store.create(profile()).await;

        assert!(store.get(&session.token).await.is_some());
        assert!(session.expires_at <= Utc::now() + Duration::minutes(MAX_SESSION_TTL_MINUTES));
    }

    #[tokio::test]
    async fn test_state_is_single_use() {
        let store = SessionStore::new(60);
        let state = store.begin_sign_in(Some("/dashboard/courses".into())).await;

        assert_eq!(
            store.finish_sign_in(&state).await,
            Some(Some("/dashboard/courses".to_string()))
        );
        assert_eq!(store.finish_sign_in(&state).await, None);
        assert_eq!(store.finish_sign_in("made-up").await, None);
    }

    #[test]
    fn test_cookie_parsing() {
        assert_eq!(
            token_from_cookie_header("theme=dark; scholarly_session=abc123; other=1"),
            Some("abc123")
        );
        assert_eq!(token_from_cookie_header("scholarly_session="), None);
        assert_eq!(token_from_cookie_header("theme=dark"), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("t", 3600, true);
        assert!(cookie.starts_with("scholarly_session=t;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("; Secure"));
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}

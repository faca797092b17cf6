//! Auth Routes
//!
//! - GET /api/auth/authorize?callbackUrl= - Start signing in
//! - GET /api/auth/callback?code=&state= - Finish signing in, set the cookie
//! - GET /api/auth/session - Current session, or 401
//! - POST /api/auth/signout - End the session, clear the cookie

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::{
    clear_session_cookie, sanitize_callback, session_cookie, token_from_cookie_header, AuthError,
    IdentityProvider, Session,
};

/// Path the provider sends the browser back to
pub const CALLBACK_PATH: &str = "/api/auth/callback";

#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

/// Session for the request's cookie, if any
pub async fn current_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    session_for_cookies(state, cookies).await
}

/// Session for a raw `Cookie` header value
pub async fn session_for_cookies(state: &AppState, cookies: &str) -> Option<Session> {
    let token = token_from_cookie_header(cookies)?;
    state.sessions.get(token).await
}

/// GET /api/auth/authorize
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthorizeParams>,
) -> ApiResult<Redirect> {
    let provider = provider(&state)?;

    let callback = params.callback_url.as_deref().and_then(sanitize_callback);
    let sign_in_state = state.sessions.begin_sign_in(callback).await;

    let url = provider.authorize_url(CALLBACK_PATH, &sign_in_state);
    tracing::debug!(provider = provider.name(), "Sign-in started");
    Ok(Redirect::to(&url))
}

/// GET /api/auth/callback
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Response> {
    let provider = provider(&state)?;

    let callback = state
        .sessions
        .finish_sign_in(&params.state)
        .await
        .ok_or(AuthError::InvalidState)?;

    let profile = provider.exchange_code(&params.code).await?;
    let session = state.sessions.create(profile).await;

    let cookie = session_cookie(
        &session.token,
        state.auth.session_ttl_minutes * 60,
        state.auth.secure_cookies,
    );
    let target = state.policy.post_sign_in_target(callback.as_deref());

    tracing::info!(user = %session.profile.id, target = %target, "Signed in");
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&target)).into_response())
}

/// GET /api/auth/session
pub async fn session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Session>> {
    current_session(&state, &headers)
        .await
        .map(Json)
        .ok_or(ApiError::Unauthorized)
}

/// POST /api/auth/signout
pub async fn signout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let token = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(token_from_cookie_header);

    let revoked = match token {
        Some(token) => state.sessions.revoke(token).await,
        None => false,
    };
    tracing::info!(revoked, "Signed out");

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(serde_json::json!({ "signed_out": revoked })),
    )
        .into_response()
}

fn provider(state: &AppState) -> ApiResult<&dyn IdentityProvider> {
    state
        .provider
        .as_deref()
        .ok_or(ApiError::Auth(AuthError::ProviderDisabled))
}

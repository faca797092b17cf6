//! Page Routes
//!
//! Placeholders for the launch (sign-in) page and the dashboard. Rendering
//! happens client-side; these only report what the page would show. Access
//! is enforced by the route guard before a handler runs.

use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::auth::current_session;
use crate::api::state::AppState;
use crate::auth::callback_from_query;
use crate::profile::UserProfile;

#[derive(Debug, Serialize)]
pub struct LaunchPage {
    pub page: &'static str,
    pub sign_in_enabled: bool,
    /// Where the sign-in button points
    pub authorize_url: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub page: &'static str,
    pub path: String,
    pub user: UserProfile,
}

/// GET /launch
pub async fn launch(State(state): State<Arc<AppState>>, uri: Uri) -> Json<LaunchPage> {
    let authorize_url = match uri.query().and_then(callback_from_query) {
        Some(callback) => format!(
            "/api/auth/authorize?callbackUrl={}",
            urlencoding::encode(&callback)
        ),
        None => "/api/auth/authorize".to_string(),
    };

    Json(LaunchPage {
        page: "launch",
        sign_in_enabled: state.provider.is_some(),
        authorize_url,
    })
}

/// GET /dashboard, GET /dashboard/*
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
) -> ApiResult<Json<DashboardPage>> {
    let session = current_session(&state, &headers)
        .await
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(DashboardPage {
        page: "dashboard",
        path: uri.path().to_string(),
        user: session.profile,
    }))
}

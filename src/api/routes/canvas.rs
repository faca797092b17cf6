//! Canvas Proxy Routes
//!
//! - GET /api/canvas/courses - Active courses for the configured token
//! - GET /api/canvas/courses/:course_id/assignments - A course's assignments
//!
//! Upstream bodies are passed through untouched. Upstream non-2xx statuses
//! are propagated with the Canvas status line as the error message; any other
//! failure is logged and answered with a generic 500.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::{AppState, CanvasBackend};
use crate::canvas::{CanvasClient, CanvasError};

/// GET /api/canvas/courses
pub async fn list_courses(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Value>>> {
    let client = client(&state)?;

    let courses = client
        .list_courses()
        .await
        .map_err(|e| proxy_error(e, "Failed to fetch courses"))?;

    tracing::debug!(count = courses.len(), "Fetched courses");
    Ok(Json(courses))
}

/// GET /api/canvas/courses/:course_id/assignments
pub async fn list_assignments(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let client = client(&state)?;

    let assignments = client
        .list_assignments(&course_id)
        .await
        .map_err(|e| proxy_error(e, "Failed to fetch assignments"))?;

    tracing::debug!(course_id = %course_id, count = assignments.len(), "Fetched assignments");
    Ok(Json(assignments))
}

fn client(state: &AppState) -> ApiResult<&CanvasClient> {
    match &state.canvas {
        CanvasBackend::Ready(client) => Ok(client),
        CanvasBackend::Unconfigured(message) => Err(ApiError::Configuration(message.clone())),
    }
}

fn proxy_error(error: CanvasError, generic: &str) -> ApiError {
    match &error {
        CanvasError::Upstream { status, .. } => {
            let message = error.to_string();
            tracing::warn!(status = *status, "{}", message);
            ApiError::Upstream {
                status: *status,
                message,
            }
        }
        CanvasError::InvalidCourseId => ApiError::Validation(error.to_string()),
        _ => {
            tracing::error!(error = %error, "{}", generic);
            ApiError::Internal(generic.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_message_hides_details() {
        let err = proxy_error(CanvasError::Parse("eof at 12".into()), "Failed to fetch courses");
        assert_eq!(err.to_string(), "Failed to fetch courses");
    }

    #[test]
    fn test_upstream_message() {
        let err = proxy_error(
            CanvasError::Upstream {
                status: 401,
                reason: "Unauthorized".into(),
            },
            "Failed to fetch courses",
        );
        assert!(matches!(err, ApiError::Upstream { status: 401, .. }));
        assert_eq!(err.to_string(), "Canvas API error: 401 Unauthorized");
    }
}

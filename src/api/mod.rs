//! Scholarly HTTP API
//!
//! Server side of the dashboard, built with Axum.
//!
//! # Endpoints
//!
//! ## Canvas proxy
//! - `GET /api/canvas/courses` - Active courses
//! - `GET /api/canvas/courses/:course_id/assignments` - A course's assignments
//!
//! ## Auth
//! - `GET /api/auth/authorize` - Start signing in
//! - `GET /api/auth/callback` - Finish signing in
//! - `GET /api/auth/session` - Current session
//! - `POST /api/auth/signout` - Sign out
//!
//! ## Pages
//! - `GET /launch` - Sign-in page
//! - `GET /dashboard`, `GET /dashboard/*` - Requires a session
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use chrona::api::{serve, AppState, CanvasBackend};
//! use chrona::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let canvas = CanvasBackend::from_config(config.canvas.resolve());
//!
//!     let state = AppState::new(canvas, config.auth.clone(), config.api.clone());
//!     serve(state).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, CanvasBackend};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::RouteDecision;
use crate::config::ApiConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let canvas_routes = Router::new()
        .route("/courses", get(routes::canvas::list_courses))
        .route(
            "/courses/:course_id/assignments",
            get(routes::canvas::list_assignments),
        );

    let auth_routes = Router::new()
        .route("/authorize", get(routes::auth::authorize))
        .route("/callback", get(routes::auth::callback))
        .route("/session", get(routes::auth::session))
        .route("/signout", post(routes::auth::signout));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config);
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/canvas", canvas_routes)
        .nest("/api/auth", auth_routes)
        .nest("/health", health_routes)
        .route("/launch", get(routes::pages::launch))
        .route("/dashboard", get(routes::pages::dashboard))
        .route("/dashboard/*rest", get(routes::pages::dashboard))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&shared_state),
            route_guard,
        ))
        // Requests still running after the limit are answered with 408
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Apply the route policy before any handler runs
async fn route_guard(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let needs_session = {
        let path = request.uri().path();
        state.policy.is_protected(path) || path == state.policy.launch_path()
    };
    let cookies = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let authenticated = match cookies {
        Some(cookies) if needs_session => routes::auth::session_for_cookies(&state, &cookies)
            .await
            .is_some(),
        _ => false,
    };

    let decision = state
        .policy
        .decide(request.uri().path(), request.uri().query(), authenticated);

    match decision {
        RouteDecision::Allow => next.run(request).await,
        RouteDecision::Redirect(target) => {
            tracing::debug!(from = %request.uri(), to = %target, "Route guard redirect");
            Redirect::to(&target).into_response()
        }
    }
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Scholarly API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Scholarly API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::build_provider;
    use crate::config::{AuthConfig, AuthProviderKind, CanvasSettings, Environment};
    use axum::{
        body::Body,
        extract::Path,
        http::{HeaderMap, StatusCode, Uri},
        Json,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::util::ServiceExt;

    const TOKEN: &str = "test-token";

    async fn fake_courses(
        State(hits): State<Arc<AtomicUsize>>,
        headers: HeaderMap,
        uri: Uri,
    ) -> Response {
        hits.fetch_add(1, Ordering::SeqCst);
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if auth != Some("Bearer test-token") {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        if uri.query() != Some("enrollment_state=active&per_page=100") {
            return StatusCode::BAD_REQUEST.into_response();
        }
        Json(json!([{ "id": 101, "name": "Linear Algebra" }])).into_response()
    }

    async fn fake_assignments(
        State(hits): State<Arc<AtomicUsize>>,
        Path(course_id): Path<String>,
    ) -> Response {
        hits.fetch_add(1, Ordering::SeqCst);
        match course_id.as_str() {
            "404" => return StatusCode::NOT_FOUND.into_response(),
            "slow" => tokio::time::sleep(std::time::Duration::from_secs(4)).await,
            _ => {}
        }
        Json(json!([{ "id": 7, "course_id": course_id, "name": "Problem Set 1" }])).into_response()
    }

    /// Serve a stand-in Canvas on an ephemeral port
    async fn spawn_fake_canvas() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/api/v1/courses", get(fake_courses))
            .route("/api/v1/courses/:id/assignments", get(fake_assignments))
            .with_state(Arc::clone(&hits));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/", addr), hits)
    }

    fn canvas(base_url: Option<String>) -> CanvasBackend {
        let settings = CanvasSettings {
            base_url,
            access_token: Some(TOKEN.to_string()),
            request_timeout_secs: 5,
        };
        CanvasBackend::from_config(settings.resolve())
    }

    fn mock_auth() -> AuthConfig {
        AuthConfig {
            provider: AuthProviderKind::Mock,
            environment: Environment::Development,
            ..AuthConfig::default()
        }
    }

    fn create_test_app(canvas: CanvasBackend, auth: AuthConfig) -> Router {
        create_test_app_with(canvas, auth, ApiConfig::default())
    }

    fn create_test_app_with(canvas: CanvasBackend, auth: AuthConfig, api: ApiConfig) -> Router {
        let provider = build_provider(&auth).unwrap();
        let state = AppState::new(canvas, auth, api).with_provider(provider);
        build_router(state)
    }

    async fn get_request(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = axum::http::Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        app.clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn location(response: &Response) -> String {
        response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_string()
    }

    /// Sign in through the mock provider and return the cookie pair
    async fn sign_in(app: &Router, callback: &str) -> (String, String) {
        let uri = format!(
            "/api/auth/authorize?callbackUrl={}",
            urlencoding::encode(callback)
        );
        let response = get_request(app, &uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let provider_redirect = location(&response);
        assert!(provider_redirect.starts_with("/api/auth/callback?code=mock-"));

        let response = get_request(app, &provider_redirect, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        (cookie, location(&response))
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = create_test_app(canvas(None), AuthConfig::default());

        for uri in ["/health/live", "/health/ready"] {
            let response = get_request(&app, uri, None).await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = get_request(&app, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["canvas"], "unconfigured");
        assert_eq!(body["auth"], "disabled");
    }

    #[tokio::test]
    async fn test_courses_pass_through() {
        let (base_url, hits) = spawn_fake_canvas().await;
        let app = create_test_app(canvas(Some(base_url)), AuthConfig::default());

        let response = get_request(&app, "/api/canvas/courses", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!([{ "id": 101, "name": "Linear Algebra" }])
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_assignments_pass_through() {
        let (base_url, _hits) = spawn_fake_canvas().await;
        let app = create_test_app(canvas(Some(base_url)), AuthConfig::default());

        let response = get_request(&app, "/api/canvas/courses/101/assignments", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body[0]["course_id"], "101");
    }

    #[tokio::test]
    async fn test_upstream_status_propagated() {
        let (base_url, _hits) = spawn_fake_canvas().await;
        let app = create_test_app(canvas(Some(base_url)), AuthConfig::default());

        let response = get_request(&app, "/api/canvas/courses/404/assignments", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Canvas API error: 404 Not Found");
        assert_eq!(body["code"], "UPSTREAM_ERROR");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let (base_url, hits) = spawn_fake_canvas().await;
        let api = ApiConfig {
            request_timeout_secs: 1,
            ..ApiConfig::default()
        };
        let app = create_test_app_with(canvas(Some(base_url)), AuthConfig::default(), api);

        let response = get_request(&app, "/api/canvas/courses/slow/assignments", None).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let response = get_request(&app, "/api/canvas/courses/101/assignments", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_config_is_500_without_outbound_call() {
        let (_base_url, hits) = spawn_fake_canvas().await;
        let app = create_test_app(canvas(None), AuthConfig::default());

        let response = get_request(&app, "/api/canvas/courses", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("CANVAS_BASE_URL"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_generic_500() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let app = create_test_app(
            canvas(Some(format!("http://{}", addr))),
            AuthConfig::default(),
        );

        let response = get_request(&app, "/api/canvas/courses", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Failed to fetch courses");

        let response = get_request(&app, "/api/canvas/courses/1/assignments", None).await;
        assert_eq!(
            json_body(response).await["error"],
            "Failed to fetch assignments"
        );
    }

    #[tokio::test]
    async fn test_dashboard_redirects_to_launch() {
        let app = create_test_app(canvas(None), mock_auth());

        let response = get_request(&app, "/dashboard/courses", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            location(&response),
            "/launch?callbackUrl=%2Fdashboard%2Fcourses"
        );

        let response = get_request(&app, "/launch", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["sign_in_enabled"], true);
    }

    #[tokio::test]
    async fn test_sign_in_flow() {
        let app = create_test_app(canvas(None), mock_auth());

        let (cookie, target) = sign_in(&app, "/dashboard/courses").await;
        assert!(cookie.starts_with("scholarly_session="));
        assert_eq!(target, "/dashboard/courses");

        let response = get_request(&app, "/dashboard/courses", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["user"]["provider"], "mock");
        assert_eq!(body["path"], "/dashboard/courses");

        let response = get_request(&app, "/api/auth/session", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);

        // Signed-in visitors skip the launch page
        let response = get_request(&app, "/launch", Some(&cookie)).await;
        assert_eq!(location(&response), "/dashboard");
        let response = get_request(
            &app,
            "/launch?callbackUrl=%2Fdashboard%2Fgrades",
            Some(&cookie),
        )
        .await;
        assert_eq!(location(&response), "/dashboard/grades");
    }

    #[tokio::test]
    async fn test_sign_out() {
        let app = create_test_app(canvas(None), mock_auth());
        let (cookie, _) = sign_in(&app, "/dashboard").await;

        let response = app
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/auth/signout")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));

        let response = get_request(&app, "/api/auth/session", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = get_request(&app, "/dashboard", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_callback_rejects_unknown_state() {
        let app = create_test_app(canvas(None), mock_auth());

        let response = get_request(&app, "/api/auth/callback?code=mock-1&state=forged", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sign_in_disabled() {
        let app = create_test_app(canvas(None), AuthConfig::default());

        let response = get_request(&app, "/api/auth/authorize", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

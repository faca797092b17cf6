//! Canvas LMS REST API Client
//!
//! Thin HTTP client for the two Canvas endpoints the dashboard needs. Bodies
//! are passed through as JSON values; the proxy never reshapes upstream data.
//! No retries and no caching: one request in, one request out.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Fixed page size for list requests
pub const PAGE_SIZE: u32 = 100;

/// Resolved Canvas connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    /// Instance root without trailing slash, e.g. "https://school.instructure.com"
    pub base_url: String,
    /// Bearer token sent on every request
    pub access_token: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Canvas REST API client
pub struct CanvasClient {
    client: Client,
    config: CanvasConfig,
}

impl CanvasClient {
    /// Create a new Canvas client with the given configuration
    pub fn new(config: CanvasConfig) -> Result<Self, CanvasError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("scholarly/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CanvasError::Request)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// URL for the active-courses listing
    pub fn courses_url(&self) -> String {
        format!(
            "{}/api/v1/courses?enrollment_state=active&per_page={}",
            self.config.base_url, PAGE_SIZE
        )
    }

    /// URL for a course's assignment listing
    pub fn assignments_url(&self, course_id: &str) -> String {
        format!(
            "{}/api/v1/courses/{}/assignments?per_page={}",
            self.config.base_url,
            urlencoding::encode(course_id),
            PAGE_SIZE
        )
    }

    /// List the caller's active courses
    pub async fn list_courses(&self) -> Result<Vec<Value>, CanvasError> {
        self.get_list(&self.courses_url()).await
    }

    /// List assignments for a course
    pub async fn list_assignments(&self, course_id: &str) -> Result<Vec<Value>, CanvasError> {
        if course_id.trim().is_empty() {
            return Err(CanvasError::InvalidCourseId);
        }
        self.get_list(&self.assignments_url(course_id)).await
    }

    async fn get_list(&self, url: &str) -> Result<Vec<Value>, CanvasError> {
        tracing::debug!(url = %url, "Canvas request");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CanvasError::Timeout
                } else {
                    CanvasError::Request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CanvasError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| CanvasError::Parse(e.to_string()))
    }
}

/// Errors that can occur when talking to Canvas
#[derive(Error, Debug)]
pub enum CanvasError {
    /// Canvas answered with a non-2xx status
    #[error("Canvas API error: {status} {reason}")]
    Upstream { status: u16, reason: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timeout")]
    Timeout,

    #[error("Malformed Canvas response: {0}")]
    Parse(String),

    #[error("Course id must not be empty")]
    InvalidCourseId,
}

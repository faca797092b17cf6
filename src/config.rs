//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides. The
//! configuration is resolved once at startup; required upstream credentials
//! are checked by `CanvasSettings::resolve`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::auth::MAX_SESSION_TTL_MINUTES;
use crate::canvas::CanvasConfig;
use crate::layout::{GridConfig, LayoutMode};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub canvas: CanvasSettings,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Canvas LMS upstream settings, as loaded. Both fields are required to
/// reach the upstream; see `resolve`.
#[derive(Debug, Clone, Deserialize)]
pub struct CanvasSettings {
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_canvas_timeout")]
    pub request_timeout_secs: u64,
}

fn default_canvas_timeout() -> u64 {
    15
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            access_token: None,
            request_timeout_secs: default_canvas_timeout(),
        }
    }
}

impl CanvasSettings {
    /// Check the required fields and build the client configuration
    pub fn resolve(&self) -> Result<CanvasConfig, ConfigError> {
        let base_url = non_empty(&self.base_url).ok_or(ConfigError::Missing {
            field: "canvas.base_url",
            env: CANVAS_BASE_URL_VARS[0],
        })?;
        let access_token = non_empty(&self.access_token).ok_or(ConfigError::Missing {
            field: "canvas.access_token",
            env: CANVAS_ACCESS_TOKEN_VARS[0],
        })?;

        Ok(CanvasConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            request_timeout_secs: self.request_timeout_secs,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    #[default]
    Production,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

/// Which identity provider signs users in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthProviderKind {
    /// No sign-in available
    #[default]
    Disabled,
    /// Fixed demo student; development only
    Mock,
}

impl std::str::FromStr for AuthProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disabled" | "none" => Ok(AuthProviderKind::Disabled),
            "mock" => Ok(AuthProviderKind::Mock),
            other => Err(format!("unknown auth provider: {}", other)),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub provider: AuthProviderKind,

    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: i64,

    /// Where signed-in users land when no callback URL is pending
    #[serde(default = "default_landing_path")]
    pub landing_path: String,

    /// Set the `Secure` attribute on the session cookie
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_session_ttl() -> i64 {
    8 * 60
}

fn default_landing_path() -> String {
    "/dashboard".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            provider: AuthProviderKind::default(),
            session_ttl_minutes: default_session_ttl(),
            landing_path: default_landing_path(),
            secure_cookies: false,
        }
    }
}

/// Dashboard defaults
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub grid: GridConfig,

    #[serde(default)]
    pub layout: LayoutMode,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,

    #[serde(default = "default_intro_auto_start")]
    pub intro_auto_start: bool,
}

fn default_viewport_width() -> f64 {
    1440.0
}

fn default_viewport_height() -> f64 {
    900.0
}

fn default_intro_auto_start() -> bool {
    true
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            layout: LayoutMode::default(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            intro_auto_start: default_intro_auto_start(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Install the global tracing subscriber. `RUST_LOG` wins over `level`.
    pub fn init_tracing(&self) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("chrona={},tower_http=debug", self.level).into()
        });

        let registry = tracing_subscriber::registry().with(filter);
        if self.format == "json" {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        } else {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }
}

/// Environment variables for the Canvas base URL, in priority order
pub const CANVAS_BASE_URL_VARS: [&str; 2] = ["CANVAS_BASE_URL", "PUBLIC_CANVAS_BASE_URL"];

/// Environment variables for the Canvas access token, in priority order
pub const CANVAS_ACCESS_TOKEN_VARS: [&str; 2] = ["CANVAS_ACCESS_TOKEN", "PUBLIC_CANVAS_ACCESS_TOKEN"];

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("scholarly").join("config.toml")),
            Some(PathBuf::from("/etc/scholarly/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_of = |names: &[&str]| names.iter().find_map(|name| lookup(name));

        // API overrides
        if let Some(host) = lookup("SCHOLARLY_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("SCHOLARLY_API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => tracing::warn!("Ignoring invalid SCHOLARLY_API_PORT: {}", port),
            }
        }

        // Canvas overrides
        if let Some(url) = first_of(&CANVAS_BASE_URL_VARS) {
            self.canvas.base_url = Some(url);
        }
        if let Some(token) = first_of(&CANVAS_ACCESS_TOKEN_VARS) {
            self.canvas.access_token = Some(token);
        }

        // Auth overrides
        if let Some(env) = lookup("SCHOLARLY_ENV") {
            match env.parse() {
                Ok(e) => self.auth.environment = e,
                Err(e) => tracing::warn!("Ignoring SCHOLARLY_ENV: {}", e),
            }
        }
        if let Some(provider) = lookup("SCHOLARLY_AUTH_PROVIDER") {
            match provider.parse() {
                Ok(p) => self.auth.provider = p,
                Err(e) => tracing::warn!("Ignoring SCHOLARLY_AUTH_PROVIDER: {}", e),
            }
        }

        // Logging overrides
        if let Some(level) = lookup("SCHOLARLY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SCHOLARLY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Reject configurations that must never run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.provider == AuthProviderKind::Mock
            && self.auth.environment != Environment::Development
        {
            return Err(ConfigError::Invalid(format!(
                "the mock auth provider is only available in development (environment is {:?})",
                self.auth.environment
            )));
        }

        let ttl = self.auth.session_ttl_minutes;
        if ttl <= 0 || ttl > MAX_SESSION_TTL_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "auth.session_ttl_minutes must be between 1 and {}",
                MAX_SESSION_TTL_MINUTES
            )));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "api.request_timeout_secs must be positive".to_string(),
            ));
        }

        if !self.auth.landing_path.starts_with('/') {
            return Err(ConfigError::Invalid(
                "auth.landing_path must be an absolute path".to_string(),
            ));
        }

        let cell = self.dashboard.grid.cell_size;
        if !cell.is_finite() || cell <= 0.0 {
            return Err(ConfigError::Invalid(
                "dashboard.grid.cell_size must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Missing required setting {field} (set {env})")]
    Missing {
        field: &'static str,
        env: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Scholarly / Chrona Configuration
#
# Environment variables override these settings:
# - SCHOLARLY_API_HOST
# - SCHOLARLY_API_PORT
# - SCHOLARLY_ENV
# - SCHOLARLY_AUTH_PROVIDER
# - SCHOLARLY_LOG_LEVEL
# - SCHOLARLY_LOG_FORMAT
# - CANVAS_BASE_URL (fallback PUBLIC_CANVAS_BASE_URL)
# - CANVAS_ACCESS_TOKEN (fallback PUBLIC_CANVAS_ACCESS_TOKEN)

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 3000

# Allowed CORS origins
cors_origins = ["http://localhost:3000", "http://127.0.0.1:3000"]

# Request timeout in seconds; slower requests get 408
request_timeout_secs = 30

[canvas]
# Canvas LMS instance, e.g. "https://school.instructure.com"
# base_url = ""

# Canvas personal access token
# access_token = ""

# Upstream request timeout in seconds
request_timeout_secs = 15

[auth]
# development, staging or production (unset means production)
environment = "production"

# Identity provider: disabled or mock (mock requires development)
provider = "disabled"

# Session lifetime in minutes
session_ttl_minutes = 480

# Landing route after sign-in when no callback URL is pending
landing_path = "/dashboard"

# Mark the session cookie Secure (enable behind HTTPS)
secure_cookies = false

[dashboard]
# orbital, grid, masonry or spiral
layout = "orbital"
viewport_width = 1440.0
viewport_height = 900.0
intro_auto_start = true

[dashboard.grid]
cell_size = 40.0
enabled = true
show_guides = false
snap_threshold = 20.0

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

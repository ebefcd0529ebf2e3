//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! session broker, including environment variable loading, TOML files and
//! validation. Everything here is fixed at deploy time.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub backend: BackendSettings,
    pub matchmaking: MatchmakingSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Address the HTTP listener binds to
    pub http_host: String,
    /// Port for the match, health and metrics endpoints
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Which session backend implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The hosted GameLift-compatible JSON API
    Gamelift,
    /// In-process backend, for local development
    Memory,
}

/// Session hosting backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub kind: BackendKind,
    /// Region the backend lives in
    pub region: String,
    /// Explicit endpoint; derived from the region when unset
    pub endpoint: Option<String>,
    /// Per-call request timeout in seconds
    pub request_timeout_seconds: u64,
}

/// Matchmaking-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// Routing queue every request is routed through
    pub target_queue_name: String,
    /// Maximum players in a newly placed session
    pub max_player_count: u32,
    /// How many routing queues are fetched per lookup
    pub queue_page_limit: u32,
    /// Request a placement when admission into a found session fails
    pub fallback_to_placement: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "session-broker".to_string(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            kind: BackendKind::Gamelift,
            region: "us-east-1".to_string(),
            endpoint: None,
            request_timeout_seconds: 10,
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            target_queue_name: "rtgl-queue-2022-1".to_string(),
            max_player_count: 2,
            queue_page_limit: 5,
            fallback_to_placement: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            self.service.http_host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            self.service.http_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Backend settings
        if let Ok(kind) = env::var("BACKEND_KIND") {
            self.backend.kind = match kind.to_lowercase().as_str() {
                "gamelift" => BackendKind::Gamelift,
                "memory" => BackendKind::Memory,
                _ => return Err(anyhow!("Invalid BACKEND_KIND value: {}", kind)),
            };
        }
        if let Ok(region) = env::var("BACKEND_REGION") {
            self.backend.region = region;
        }
        if let Ok(endpoint) = env::var("BACKEND_ENDPOINT") {
            self.backend.endpoint = Some(endpoint);
        }
        if let Ok(timeout) = env::var("BACKEND_REQUEST_TIMEOUT_SECONDS") {
            self.backend.request_timeout_seconds = timeout.parse().map_err(|_| {
                anyhow!("Invalid BACKEND_REQUEST_TIMEOUT_SECONDS value: {}", timeout)
            })?;
        }

        // Matchmaking settings
        if let Ok(queue) = env::var("TARGET_QUEUE_NAME") {
            self.matchmaking.target_queue_name = queue;
        }
        if let Ok(max_players) = env::var("MAX_PLAYER_COUNT") {
            self.matchmaking.max_player_count = max_players
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_PLAYER_COUNT value: {}", max_players))?;
        }
        if let Ok(limit) = env::var("QUEUE_PAGE_LIMIT") {
            self.matchmaking.queue_page_limit = limit
                .parse()
                .map_err(|_| anyhow!("Invalid QUEUE_PAGE_LIMIT value: {}", limit))?;
        }
        if let Ok(fallback) = env::var("FALLBACK_TO_PLACEMENT") {
            self.matchmaking.fallback_to_placement = fallback
                .parse()
                .map_err(|_| anyhow!("Invalid FALLBACK_TO_PLACEMENT value: {}", fallback))?;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get backend request timeout as Duration
    pub fn backend_request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_seconds)
    }

    /// Backend endpoint, derived from the region when not set explicitly
    pub fn backend_endpoint(&self) -> String {
        self.backend
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://gamelift.{}.amazonaws.com", self.backend.region))
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.backend.region.is_empty() {
        return Err(anyhow!("Backend region cannot be empty"));
    }
    if let Some(endpoint) = &config.backend.endpoint {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(anyhow!("Backend endpoint must be an http(s) URL: {}", endpoint));
        }
    }
    if config.backend.request_timeout_seconds == 0 {
        return Err(anyhow!("Backend request timeout must be greater than 0"));
    }

    if config.matchmaking.target_queue_name.is_empty() {
        return Err(anyhow!("Target queue name cannot be empty"));
    }
    if config.matchmaking.max_player_count == 0 {
        return Err(anyhow!("Max player count must be greater than 0"));
    }
    if config.matchmaking.queue_page_limit == 0 {
        return Err(anyhow!("Queue page limit must be greater than 0"));
    }

    Ok(())
}

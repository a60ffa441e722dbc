//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use medtrack_shared::constants::{DEFAULT_AI_MODEL, DEFAULT_HTTP_PORT};
use medtrack_store::{Clock, LocalClock, UtcClock};

/// Which wall clock defines "today" and "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPolicy {
    Local,
    Utc,
}

impl ClockPolicy {
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self {
            ClockPolicy::Local => Arc::new(LocalClock),
            ClockPolicy::Utc => Arc::new(UtcClock),
        }
    }
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// Deployment label reported by `/api/health`.
    /// Env: `APP_ENV`
    /// Default: `development`
    pub environment: String,

    /// Env: `CLOCK` (`local` or `utc`)
    /// Default: `local`
    pub clock: ClockPolicy,

    /// API key for the chat completion provider. Without one, insights are
    /// served from the static fallback set.
    /// Env: `OPENAI_API_KEY`
    pub openai_api_key: Option<String>,

    /// Env: `OPENAI_BASE_URL`
    /// Default: `https://api.openai.com/v1`
    pub openai_base_url: String,

    /// Env: `OPENAI_MODEL`
    /// Default: `gpt-4o`
    pub openai_model: String,

    /// Upper bound on a single insight request; expiry counts as failure.
    /// Env: `AI_TIMEOUT_SECS`
    /// Default: 15 seconds
    pub ai_timeout: Duration,

    /// Allowed CORS origin. Unset means any origin.
    /// Env: `CORS_ORIGIN`
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            environment: "development".to_string(),
            clock: ClockPolicy::Local,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: DEFAULT_AI_MODEL.to_string(),
            ai_timeout: Duration::from_secs(15),
            cors_origin: None,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("environment", &self.environment)
            .field("clock", &self.clock)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("ai_timeout", &self.ai_timeout)
            .field("cors_origin", &self.cors_origin)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(env) = lookup("APP_ENV") {
            if !env.is_empty() {
                config.environment = env;
            }
        }

        if let Some(val) = lookup("CLOCK") {
            match val.to_ascii_lowercase().as_str() {
                "local" => config.clock = ClockPolicy::Local,
                "utc" => config.clock = ClockPolicy::Utc,
                _ => tracing::warn!(value = %val, "Invalid CLOCK, using local time"),
            }
        }

        if let Some(key) = lookup("OPENAI_API_KEY") {
            if !key.is_empty() {
                config.openai_api_key = Some(key);
            }
        }

        if let Some(url) = lookup("OPENAI_BASE_URL") {
            if !url.is_empty() {
                config.openai_base_url = url.trim_end_matches('/').to_string();
            }
        }

        if let Some(model) = lookup("OPENAI_MODEL") {
            if !model.is_empty() {
                config.openai_model = model;
            }
        }

        if let Some(val) = lookup("AI_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.ai_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid AI_TIMEOUT_SECS, using default"),
            }
        }

        if let Some(origin) = lookup("CORS_ORIGIN") {
            if !origin.is_empty() && origin != "*" {
                config.cors_origin = Some(origin);
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

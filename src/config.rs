//! Environment-variable configuration surface (C10, §6).
//!
//! Mirrors the original system's flat `os.getenv`-with-defaults discipline: there is
//! no config file and no CLI flag layer, just environment variables read once at
//! process start.

use std::env;

use crate::error::{EngineError, EngineResult};

/// Validated process configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    /// API key for the upstream Cerebras account. Absent is tolerated at startup —
    /// a per-debate `apiKey` override can substitute it — but logged as a warning.
    pub cerebras_api_key: Option<String>,
    /// Base URL of the upstream OpenAI-compatible endpoint.
    pub cerebras_base_url: String,
    /// Bind host for the WebSocket transport.
    pub host: String,
    /// Bind port for the WebSocket transport.
    pub port: u16,
    /// Origin allowed through CORS for the WebSocket/HTTP transport.
    pub frontend_url: String,
    /// Verbose/debug mode flag (surfaced to the transport layer for e.g. richer error bodies).
    pub debug: bool,
    /// Upstream model id used for the `"fast"` tier, and as the fallback model for `"pro"`.
    pub fast_model_id: String,
    /// Upstream model id used for the `"pro"` tier.
    pub pro_model_id: String,
}

impl Settings {
    /// Load settings from the process environment, applying the defaults in §6.
    pub fn from_env() -> Self {
        let cerebras_api_key = env::var("CEREBRAS_API_KEY").ok().filter(|s| !s.is_empty());
        if cerebras_api_key.is_none() {
            log::warn!("CEREBRAS_API_KEY not set; debates must supply a per-request apiKey override");
        }

        Settings {
            cerebras_api_key,
            cerebras_base_url: env_or("CEREBRAS_BASE_URL", "https://api.cerebras.ai/v1"),
            host: env_or("HOST", "0.0.0.0"),
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8000),
            frontend_url: env_or("FRONTEND_URL", "http://localhost:5173"),
            debug: env::var("DEBUG")
                .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            fast_model_id: env_or("FAST_MODEL_ID", "llama3.1-8b"),
            pro_model_id: env_or("PRO_MODEL_ID", "gpt-oss-120b"),
        }
    }

    /// Resolve the upstream model id for a requested tier string (`"fast"`/`"pro"`, default `"pro"`).
    pub fn model_for_tier(&self, tier: Option<&str>) -> &str {
        match tier {
            Some("fast") => &self.fast_model_id,
            _ => &self.pro_model_id,
        }
    }

    /// The fallback model id used by the round executor's retry-with-fallback path.
    pub fn fallback_model_id(&self) -> &str {
        &self.fast_model_id
    }

    /// Resolve the upstream API key for one debate: a per-request override takes
    /// precedence, falling back to the server-configured key. A configuration
    /// error (§7) if neither is available.
    pub fn resolve_api_key(&self, override_key: Option<&str>) -> EngineResult<String> {
        override_key
            .map(str::to_string)
            .or_else(|| self.cerebras_api_key.clone())
            .ok_or_else(|| EngineError::Config("No upstream API key configured for this debate".to_string()))
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|s| !s.is_empty()).unwrap_or_else(|| default.to_string())
}

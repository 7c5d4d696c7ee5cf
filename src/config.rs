//! Runtime configuration
//!
//! All environment reads live here. Binaries resolve a config once at
//! startup and inject values downstream; pipeline code never touches the
//! environment.

use std::time::Duration;

/// Model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Provider-call deadline used when `ANALYZE_TIMEOUT_SECS` is not set.
pub const DEFAULT_ASK_TIMEOUT_SECS: u64 = 300;

/// Provider-facing settings for the analysis agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Gemini model identifier, e.g. `gemini-2.0-flash`.
    pub model: String,
    /// Provider credential. May be blank; agent construction rejects it.
    pub api_key: String,
    /// Hard deadline for a single provider call.
    pub ask_timeout: Duration,
}

impl AgentConfig {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            ask_timeout: Duration::from_secs(DEFAULT_ASK_TIMEOUT_SECS),
        }
    }

    /// Resolve from the environment. Missing values fall back to defaults;
    /// a missing credential is reported by `has_credential`, not an error,
    /// so the server can start and reject analyze calls individually.
    pub fn from_env() -> Self {
        let model = std::env::var("GEMINI_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .unwrap_or_default();

        let ask_timeout_secs = std::env::var("ANALYZE_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_ASK_TIMEOUT_SECS);

        Self {
            model,
            api_key,
            ask_timeout: Duration::from_secs(ask_timeout_secs),
        }
    }

    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn with_ask_timeout(mut self, timeout: Duration) -> Self {
        self.ask_timeout = timeout;
        self
    }
}

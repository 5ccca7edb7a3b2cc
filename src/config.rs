use std::time::Duration;

use tracing::warn;

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const REPLICATE_API_TOKEN: &str = "REPLICATE_API_TOKEN";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_REPLICATE_BASE_URL: &str = "https://api.replicate.com";

/// stability-ai/sdxl
pub const DEFAULT_REPLICATE_MODEL_VERSION: &str =
    "39ed52f2a78e934b3ba6e2a89f5b1c712de7dfea535525255b1aa35c5565e08b";

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/* =========================
   Credentials
   ========================= */

/// The two service secrets. Missing values are kept as empty strings and
/// only surface once a service rejects them.
#[derive(Clone, Default)]
pub struct Credentials {
    pub gemini_api_key: String,
    pub replicate_api_token: String,
}

impl Credentials {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| match lookup(key) {
            Some(value) => value,
            None => {
                warn!(variable = key, "credential not set");
                String::new()
            }
        };

        Self {
            gemini_api_key: read(GEMINI_API_KEY),
            replicate_api_token: read(REPLICATE_API_TOKEN),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("replicate_api_token", &redact(&self.replicate_api_token))
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/* =========================
   Service endpoints
   ========================= */

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub replicate_base_url: String,
    pub replicate_model_version: String,
    pub poll_interval: Duration,
}

impl AppConfig {
    /// Loads `.env` if present, then reads everything from the environment.
    pub fn load() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!(error = %e, "failed to read .env");
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let or = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let poll_ms = lookup("REPLICATE_POLL_INTERVAL_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        Self {
            credentials: Credentials::from_lookup(&lookup),
            gemini_model: or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_base_url: or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            replicate_base_url: or("REPLICATE_BASE_URL", DEFAULT_REPLICATE_BASE_URL),
            replicate_model_version: or(
                "REPLICATE_MODEL_VERSION",
                DEFAULT_REPLICATE_MODEL_VERSION,
            ),
            poll_interval: Duration::from_millis(poll_ms),
        }
    }
}

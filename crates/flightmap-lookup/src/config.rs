//! Lookup client configuration from environment.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl LookupConfig {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: clean_key(api_key),
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("AIRPORT_LOOKUP_URL").unwrap_or(defaults.base_url),
            api_key: clean_key(env::var("AIRPORT_LOOKUP_API_KEY").ok()),
            timeout: env::var("AIRPORT_LOOKUP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn clean_key(key: Option<String>) -> Option<String> {
    key.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

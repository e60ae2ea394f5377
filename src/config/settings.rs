//! Relay settings loaded from an optional TOML file
//!
//! Nothing secret lives here. The upstream key is read from the environment
//! variable named by `upstream.api_key_env`.
//!
//! # Example
//!
//! ```toml
//! [upstream]
//! base_url = "https://openrouter.ai/api/v1"
//! referer = "https://chat.example.com"
//! api_key_env = "OPENROUTER_API_KEY"
//!
//! [relay]
//! path = "/api/chat"
//!
//! [rate_limit]
//! max_requests = 30
//! window_secs = 60
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub upstream: UpstreamSettings,

    #[serde(default)]
    pub relay: RelaySettings,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load settings from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }
}

/// Where and how the relay reaches the completion API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    /// Base URL; the relay posts to `{base_url}/chat/completions`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sent as `HTTP-Referer`, required by OpenRouter
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Environment variable holding the bearer credential
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Client timeout; unset means the HTTP client default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_referer() -> String {
    "http://localhost:3000".to_string()
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            referer: default_referer(),
            api_key_env: default_api_key_env(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Route the relay handler is mounted on
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "/api/chat".to_string()
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

/// Fixed-window limit over all callers; `max_requests = 0` disables it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default)]
    pub max_requests: u32,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_window_secs() -> u64 {
    60
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 0,
            window_secs: default_window_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() {
        let toml_content = r#"
[upstream]
base_url = "http://localhost:8000/v1"
referer = "https://chat.example.com"
api_key_env = "MY_KEY"
timeout_secs = 30

[relay]
path = "/.netlify/functions/chat"

[rate_limit]
max_requests = 10
window_secs = 5
"#;

        let settings = Settings::from_toml(toml_content).unwrap();
        assert_eq!(settings.upstream.base_url, "http://localhost:8000/v1");
        assert_eq!(settings.upstream.api_key_env, "MY_KEY");
        assert_eq!(settings.upstream.timeout_secs, Some(30));
        assert_eq!(settings.relay.path, "/.netlify/functions/chat");
        assert_eq!(settings.rate_limit.max_requests, 10);
        assert_eq!(settings.rate_limit.window_secs, 5);
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.upstream.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(settings.upstream.api_key_env, "OPENROUTER_API_KEY");
        assert!(settings.upstream.timeout_secs.is_none());
        assert_eq!(settings.relay.path, "/api/chat");
        assert_eq!(settings.rate_limit.max_requests, 0);
    }

    #[test]
    fn test_partial_table() {
        let settings = Settings::from_toml("[upstream]\nreferer = \"https://x.dev\"\n").unwrap();
        assert_eq!(settings.upstream.referer, "https://x.dev");
        assert_eq!(settings.upstream.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Settings::from_toml("[upstream\nbase_url = 1"),
            Err(ConfigError::Toml(_))
        ));
    }
}

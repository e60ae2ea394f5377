//! Application configuration
//!
//! The relay reads its credential from the environment at startup; nothing
//! secret is compiled in or exposed to chat clients.

pub mod settings;

use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::session::RequestOptions;

pub use settings::{RateLimitSettings, RelaySettings, Settings, UpstreamSettings};

/// Errors from loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Missing credential: set {0}")]
    MissingCredential(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// A string that never shows up in logs or debug output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Compare against `candidate` in time independent of where they differ
    pub fn matches(&self, candidate: &str) -> bool {
        let (expected, candidate) = (self.0.as_bytes(), candidate.as_bytes());
        if expected.len() != candidate.len() {
            return false;
        }
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Relay server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub settings: Settings,

    /// Bearer credential for the upstream API
    pub api_key: Secret,

    /// Token callers must present; `None` leaves the relay open
    pub access_token: Option<Secret>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from any variable source
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let settings = match var("ROLES_CHAT_CONFIG") {
            Some(path) => Settings::from_file(&PathBuf::from(path))?,
            None => Settings::default(),
        };

        if !settings.relay.path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "relay path must start with '/': {}",
                settings.relay.path
            )));
        }

        let api_key = var(settings.upstream.api_key_env.as_str())
            .filter(|k| !k.trim().is_empty())
            .map(Secret::new)
            .ok_or_else(|| ConfigError::MissingCredential(settings.upstream.api_key_env.clone()))?;

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".into()),
            port: var("PORT").and_then(|p| p.parse().ok()).unwrap_or(3000),
            access_token: var("RELAY_ACCESS_TOKEN")
                .filter(|t| !t.is_empty())
                .map(Secret::new),
            settings,
            api_key,
        })
    }
}

/// Chat client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full relay URL; `None` selects the demo backend
    pub relay_url: Option<String>,
    pub access_token: Option<Secret>,
    pub options: RequestOptions,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let demo = var("ROLES_CHAT_DEMO").is_some_and(|v| v == "1" || v == "true");

        let mut options = RequestOptions::default();
        if let Some(model) = var("ROLES_CHAT_MODEL") {
            options.model = model;
        }
        if let Some(max_tokens) = var("ROLES_CHAT_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            options.max_tokens = max_tokens;
        }
        if let Some(temperature) = var("ROLES_CHAT_TEMPERATURE").and_then(|v| v.parse().ok()) {
            options.temperature = temperature;
        }

        Self {
            relay_url: if demo {
                None
            } else {
                Some(var("RELAY_URL").unwrap_or_else(|| "http://127.0.0.1:3000/api/chat".into()))
            },
            access_token: var("RELAY_ACCESS_TOKEN")
                .filter(|t| !t.is_empty())
                .map(Secret::new),
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_relay_config_defaults() {
        let config = Config::from_vars(vars(&[("OPENROUTER_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.api_key.expose(), "sk-test");
        assert!(config.access_token.is_none());
        assert_eq!(config.settings.relay.path, "/api/chat");
    }

    #[test]
    fn test_missing_credential() {
        let err = Config::from_vars(vars(&[("PORT", "8080")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(ref name) if name == "OPENROUTER_API_KEY"));

        let err = Config::from_vars(vars(&[("OPENROUTER_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[test]
    fn test_relay_config_overrides() {
        let config = Config::from_vars(vars(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("RELAY_ACCESS_TOKEN", "let-me-in"),
        ]))
        .unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.access_token.unwrap().expose(), "let-me-in");
    }

    #[test]
    fn test_missing_settings_file() {
        let err = Config::from_vars(vars(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("ROLES_CHAT_CONFIG", "/nonexistent/roles-chat.toml"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_relay_path_must_be_absolute() {
        let path = std::env::temp_dir().join(format!("roles-chat-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[relay]\npath = \"api/chat\"\n").unwrap();

        let err = Config::from_vars(vars(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("ROLES_CHAT_CONFIG", path.to_str().unwrap()),
        ]))
        .unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("api/chat")));
    }

    #[test]
    fn test_secret_is_redacted() {
        let config = Config::from_vars(vars(&[("OPENROUTER_API_KEY", "sk-very-secret")])).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("Secret(***)"));
    }

    #[test]
    fn test_secret_matches() {
        let secret = Secret::new("caller-token");
        assert!(secret.matches("caller-token"));
        assert!(!secret.matches("caller-tokeN"));
        assert!(!secret.matches("caller-token2"));
        assert!(!secret.matches(""));
    }

    #[test]
    fn test_client_config() {
        let config = ClientConfig::from_vars(vars(&[]));
        assert_eq!(
            config.relay_url.as_deref(),
            Some("http://127.0.0.1:3000/api/chat")
        );
        assert_eq!(config.options, RequestOptions::default());

        let config = ClientConfig::from_vars(vars(&[
            ("ROLES_CHAT_DEMO", "1"),
            ("ROLES_CHAT_MODEL", "openai/gpt-4o-mini"),
            ("ROLES_CHAT_MAX_TOKENS", "256"),
        ]));
        assert!(config.relay_url.is_none());
        assert_eq!(config.options.model, "openai/gpt-4o-mini");
        assert_eq!(config.options.max_tokens, 256);
    }
}

//! Completion backends
//!
//! A session never talks HTTP directly. It hands a [`ChatCompletionRequest`]
//! to a [`CompletionBackend`]:
//! - [`RelayClient`] posts it to the relay, which holds the upstream credential
//! - [`MockBackend`] answers with canned demo replies when no relay is configured
//!
//! Backends also list the upstream's models; a successful listing doubles as
//! a check that the credential behind the relay works.

mod mock;
mod relay_client;
mod wire;

use async_trait::async_trait;
use thiserror::Error;

pub use mock::MockBackend;
pub use relay_client::RelayClient;
pub use wire::{
    price_per_1k, ChatCompletionRequest, ChatCompletionResponse, Completion, Usage, EMPTY_REPLY,
};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

/// Offered when the model listing is unavailable
pub const FALLBACK_MODELS: [&str; 2] = ["openai/gpt-3.5-turbo", "openai/gpt-4"];

/// Anything that can turn a chat request into assistant text
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest)
        -> Result<Completion, CompletionError>;

    /// Model ids the upstream offers
    async fn list_models(&self) -> Result<Vec<String>, CompletionError>;

    /// Model listing, or [`FALLBACK_MODELS`] when it cannot be fetched
    async fn available_models(&self) -> Vec<String> {
        match self.list_models().await {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => FALLBACK_MODELS.iter().map(|m| m.to_string()).collect(),
            Err(e) => {
                tracing::warn!("Model listing unavailable: {}", e);
                FALLBACK_MODELS.iter().map(|m| m.to_string()).collect()
            }
        }
    }

    /// Whether the backend is reachable and its credential is accepted
    async fn check_connection(&self) -> bool {
        self.list_models().await.is_ok()
    }
}

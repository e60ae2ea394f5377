//! OpenAI-compatible chat completion payloads
//!
//! Field names follow the upstream snake_case convention, so the same types
//! serve the session, the relay client and the relay's tests.

use std::ops::AddAssign;

use serde::{Deserialize, Deserializer, Serialize};

use crate::conversation::Message;

use super::CompletionError;

/// Returned in place of the reply when the upstream sends a choice without text
pub const EMPTY_REPLY: &str = "Sorry, something went wrong.";

/// Chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Token accounting reported by the upstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub prompt_tokens: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub completion_tokens: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_tokens: u32,
}

/// Some providers send `null` for counters they do not track
fn null_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(0))
}

impl Usage {
    /// e.g. `Tokens: 42 (30 + 12)`
    pub fn summary(&self) -> String {
        format!(
            "Tokens: {} ({} + {})",
            self.total_tokens, self.prompt_tokens, self.completion_tokens
        )
    }

    /// Approximate USD cost of these tokens on `model`
    pub fn estimate_cost(&self, model: &str) -> f64 {
        f64::from(self.total_tokens) / 1000.0 * price_per_1k(model)
    }
}

/// Rough USD price per 1K tokens
///
/// OpenRouter `:free` variants cost nothing; unknown models are priced
/// like gpt-3.5-turbo.
pub fn price_per_1k(model: &str) -> f64 {
    if model.ends_with(":free") {
        return 0.0;
    }
    let name = model.rsplit('/').next().unwrap_or(model);
    match name {
        "gpt-4" => 0.06,
        "gpt-4-turbo" => 0.03,
        _ => 0.002,
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// The assistant text extracted from a response
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: Option<Usage>,
}

impl Completion {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

/// Error body returned by OpenAI-compatible APIs
#[derive(Debug, Deserialize)]
pub(super) struct ErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiError {
    pub message: String,
}

impl ChatCompletionResponse {
    pub fn from_body(body: &str) -> Result<Self, CompletionError> {
        serde_json::from_str(body).map_err(|e| {
            CompletionError::Parse(format!("Failed to parse response: {} - Body: {}", e, body))
        })
    }

    /// Take the first choice's text
    pub fn into_completion(self) -> Result<Completion, CompletionError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Parse("No choices in response".to_string()))?;

        let content = choice
            .message
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| EMPTY_REPLY.to_string());

        Ok(Completion {
            content,
            usage: self.usage,
        })
    }
}

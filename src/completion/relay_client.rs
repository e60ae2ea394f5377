//! HTTP client for the completion relay
//!
//! The relay speaks the upstream chat completions format verbatim, so this is
//! a plain OpenAI-compatible client that never carries the upstream key.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

use super::wire::ErrorResponse;
use super::{ChatCompletionRequest, ChatCompletionResponse, Completion, CompletionBackend, CompletionError};

/// Path of the model listing on the relay host
const MODELS_PATH: &str = "/v1/models";

pub struct RelayClient {
    client: Client,
    url: String,
    models_url: Option<String>,
    access_token: Option<String>,
}

impl RelayClient {
    /// Create a client posting to the full relay URL (e.g. `http://127.0.0.1:3000/api/chat`)
    ///
    /// Models are listed from `/v1/models` on the same host.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let models_url = Url::parse(&url)
            .and_then(|u| u.join(MODELS_PATH))
            .map(String::from)
            .ok();

        Self {
            client: Client::new(),
            url,
            models_url,
            access_token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` to relays that require a caller token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn models_url(&self) -> Option<&str> {
        self.models_url.as_deref()
    }

    fn authorized(&self, req_builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.access_token {
            Some(ref token) => req_builder.header("Authorization", format!("Bearer {}", token)),
            None => req_builder,
        }
    }
}

fn status_error(status: StatusCode, body: String) -> CompletionError {
    let message = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(error_resp) => error_resp.error.message,
        Err(_) => body,
    };
    CompletionError::Status {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl CompletionBackend for RelayClient {
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<Completion, CompletionError> {
        let response = self
            .authorized(self.client.post(&self.url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, body));
        }

        ChatCompletionResponse::from_body(&body)?.into_completion()
    }

    async fn list_models(&self) -> Result<Vec<String>, CompletionError> {
        let url = self.models_url.as_deref().ok_or_else(|| {
            CompletionError::NotConfigured(format!("no model listing for relay URL {}", self.url))
        })?;

        let response = self.authorized(self.client.get(url)).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, body));
        }

        let body: Value = serde_json::from_str(&body)
            .map_err(|e| CompletionError::Parse(format!("Failed to parse model list: {}", e)))?;

        let models = body["data"]
            .as_array()
            .ok_or_else(|| CompletionError::Parse("No data in model list".to_string()))?
            .iter()
            .filter_map(|m| m["id"].as_str().map(|s| s.to_string()))
            .collect();

        Ok(models)
    }
}

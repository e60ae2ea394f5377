//! Completion relay
//!
//! Forwards chat completion requests to the upstream API with the server-side
//! credential attached. The request body goes out and the upstream status and
//! body come back byte for byte; the relay only checks that the body is JSON.
//! The upstream model listing is relayed the same way.

mod rate_limit;

use std::time::Duration;

use axum::{
    body::Bytes,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::{Config, RateLimitSettings, Secret, UpstreamSettings};

pub use rate_limit::RateLimiter;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    InvalidBody(String),

    #[error("{0}")]
    Upstream(#[from] reqwest::Error),

    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limit exceeded")]
    RateLimited,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidBody(_) | RelayError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Upstream status and raw body
#[derive(Debug)]
pub struct Forwarded {
    pub status: StatusCode,
    pub body: Bytes,
}

impl IntoResponse for Forwarded {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            self.body,
        )
            .into_response()
    }
}

pub struct Relay {
    client: Client,
    endpoint: String,
    models_endpoint: String,
    referer: String,
    api_key: Secret,
    access_token: Option<Secret>,
    limiter: Option<RateLimiter>,
}

impl Relay {
    pub fn new(upstream: &UpstreamSettings, api_key: Secret) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(secs) = upstream.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let base_url = upstream.base_url.trim_end_matches('/');

        Ok(Self {
            client: builder.build()?,
            endpoint: format!("{}/chat/completions", base_url),
            models_endpoint: format!("{}/models", base_url),
            referer: upstream.referer.clone(),
            api_key,
            access_token: None,
            limiter: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(&config.settings.upstream, config.api_key.clone())?
            .with_access_token(config.access_token.clone())
            .with_rate_limit(&config.settings.rate_limit))
    }

    /// Require callers to present `Authorization: Bearer <token>`
    pub fn with_access_token(mut self, token: Option<Secret>) -> Self {
        self.access_token = token;
        self
    }

    pub fn with_rate_limit(mut self, settings: &RateLimitSettings) -> Self {
        self.limiter = (settings.max_requests > 0).then(|| {
            RateLimiter::new(
                settings.max_requests,
                Duration::from_secs(settings.window_secs),
            )
        });
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check the caller, validate the body and forward it upstream
    pub async fn handle(&self, headers: &HeaderMap, body: Bytes) -> Result<Forwarded, RelayError> {
        self.admit(headers)?;

        serde_json::from_slice::<Value>(&body)
            .map_err(|e| RelayError::InvalidBody(e.to_string()))?;

        let request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .body(body);
        self.forward(request).await
    }

    /// Fetch the upstream model listing with the server-side credential
    ///
    /// Succeeds only when the upstream accepts the credential, so callers use
    /// it as a connectivity check as well.
    pub async fn handle_models(&self, headers: &HeaderMap) -> Result<Forwarded, RelayError> {
        self.admit(headers)?;
        self.forward(self.client.get(&self.models_endpoint)).await
    }

    fn admit(&self, headers: &HeaderMap) -> Result<(), RelayError> {
        self.authorize(headers)?;

        if let Some(ref limiter) = self.limiter {
            if !limiter.try_acquire() {
                tracing::warn!("Relay rate limit exceeded");
                return Err(RelayError::RateLimited);
            }
        }
        Ok(())
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), RelayError> {
        let Some(ref expected) = self.access_token else {
            return Ok(());
        };

        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match presented {
            Some(token) if expected.matches(token) => Ok(()),
            _ => {
                tracing::warn!("Rejected relay call without a valid access token");
                Err(RelayError::Unauthorized)
            }
        }
    }

    async fn forward(&self, request: reqwest::RequestBuilder) -> Result<Forwarded, RelayError> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .header("HTTP-Referer", &self.referer)
            .send()
            .await?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let body = response.bytes().await?;

        if status.is_success() {
            tracing::info!(status = status.as_u16(), bytes = body.len(), "Relayed upstream response");
        } else {
            tracing::warn!(status = status.as_u16(), "Upstream returned an error status");
        }

        Ok(Forwarded { status, body })
    }
}

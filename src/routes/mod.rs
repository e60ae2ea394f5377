//! API routes

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use serde::Serialize;

use crate::roles::{self, Role};
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_roles() -> Json<&'static [Role]> {
    Json(roles::list_roles())
}

async fn relay(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
    }

    match state.relay.handle(&headers, body).await {
        Ok(forwarded) => forwarded.into_response(),
        Err(e) => {
            tracing::error!("Relay error: {}", e);
            e.into_response()
        }
    }
}

async fn list_models(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.relay.handle_models(&headers).await {
        Ok(forwarded) => forwarded.into_response(),
        Err(e) => {
            tracing::error!("Model listing error: {}", e);
            e.into_response()
        }
    }
}

/// Routes, with the relay mounted at `relay_path`
pub fn router(relay_path: &str) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/roles", get(list_roles))
        .route("/v1/models", get(list_models))
        .route(relay_path, any(relay))
}

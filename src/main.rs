//! roles-chat relay server
//!
//! Holds the upstream API key and forwards chat completion requests from
//! chat clients. Also serves the role catalog, the model listing and a
//! health check.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roles_chat::config::Config;
use roles_chat::relay::Relay;
use roles_chat::{routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roles_chat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let relay = Relay::from_config(&config)?;
    tracing::info!("Forwarding to {}", relay.endpoint());
    if config.access_token.is_none() {
        tracing::warn!("RELAY_ACCESS_TOKEN is not set; the relay accepts any caller");
    }

    let state = AppState {
        relay: Arc::new(relay),
    };

    let app = Router::new()
        .merge(routes::router(&config.settings.relay.path))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(
        "Relay listening at http://{}{}",
        addr,
        config.settings.relay.path
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

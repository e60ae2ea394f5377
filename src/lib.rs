//! roles-chat - persona chat over an OpenAI-compatible completion API
//!
//! Users pick a persona from a fixed catalog and chat with a remote model.
//! Requests go through a small relay that attaches the upstream credential
//! server-side, so chat clients never hold the key.

use std::sync::Arc;

pub mod completion;
pub mod config;
pub mod conversation;
pub mod relay;
pub mod roles;
pub mod routes;
pub mod session;

use relay::Relay;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

//! Conversation session
//!
//! A [`Session`] owns the turns of one conversation with one persona. Sending
//! a message is split in two steps so the caller decides how to await the
//! backend:
//! 1. [`Session::submit`] appends the user turn and returns a [`Submission`]
//!    carrying the outbound request and a [`RequestToken`]
//! 2. [`Session::resolve`] applies the outcome, but only for the token that
//!    is still outstanding
//!
//! [`Session::send`] does both against a [`CompletionBackend`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::completion::{ChatCompletionRequest, Completion, CompletionBackend, CompletionError, Usage};
use crate::conversation::{Message, Turn};
use crate::roles::Role;

/// Assistant turn appended when a request fails for any reason
pub const FALLBACK_REPLY: &str = "Error contacting AI API, check token.";

/// Model parameters attached to every outbound request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            model: "deepseek/deepseek-chat-v3-0324:free".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

/// Identifies one in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(Uuid);

/// An accepted submission: the caller sends `request` and hands the outcome
/// back with `token`
#[derive(Debug, Clone)]
pub struct Submission {
    pub token: RequestToken,
    pub request: ChatCompletionRequest,
}

#[derive(Debug, Default)]
pub struct Session {
    options: RequestOptions,
    active_role: Option<&'static Role>,
    turns: Vec<Turn>,
    outstanding: Option<RequestToken>,
    usage: Usage,
}

impl Session {
    /// A session in role-selection state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RequestOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Switch to `role`, discarding all previous turns
    pub fn start(&mut self, role: &'static Role) {
        self.active_role = Some(role);
        self.turns.clear();
        self.outstanding = None;
        self.usage = Usage::default();
        self.turns.push(Turn::assistant(greeting(role)));

        tracing::debug!(role = %role.id, "Session started");
    }

    /// Accept a user message if the session can take one
    ///
    /// Returns `None` (and changes nothing) when the trimmed text is empty, no
    /// role is active, or a request is already in flight.
    pub fn submit(&mut self, text: &str) -> Option<Submission> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let role = self.active_role?;
        if self.outstanding.is_some() {
            tracing::debug!("Dropping submission while a request is pending");
            return None;
        }

        let request = self.build_request(role, text);
        self.turns.push(Turn::user(text));

        let token = RequestToken(Uuid::new_v4());
        self.outstanding = Some(token);

        Some(Submission { token, request })
    }

    /// Apply the outcome of the request identified by `token`
    ///
    /// Returns `false` for stale tokens (the session was reset or restarted
    /// since the request was submitted); those outcomes are discarded.
    pub fn resolve(
        &mut self,
        token: RequestToken,
        outcome: Result<Completion, CompletionError>,
    ) -> bool {
        if self.outstanding != Some(token) {
            tracing::debug!("Discarding response for a stale request");
            return false;
        }
        self.outstanding = None;

        match outcome {
            Ok(completion) => {
                if let Some(usage) = completion.usage {
                    self.usage += usage;
                }
                self.turns.push(Turn::assistant(completion.content));
            }
            Err(e) => {
                tracing::error!("AI API error: {}", e);
                self.turns.push(Turn::assistant(FALLBACK_REPLY));
            }
        }
        true
    }

    /// Submit `text` and wait for `backend` to answer
    ///
    /// Returns `false` if the submission was rejected.
    pub async fn send<B>(&mut self, text: &str, backend: &B) -> bool
    where
        B: CompletionBackend + ?Sized,
    {
        let Some(submission) = self.submit(text) else {
            return false;
        };
        let outcome = backend.complete(&submission.request).await;
        self.resolve(submission.token, outcome)
    }

    /// Return to role selection
    pub fn reset(&mut self) {
        self.active_role = None;
        self.turns.clear();
        self.outstanding = None;
        self.usage = Usage::default();
    }

    pub fn active_role(&self) -> Option<&'static Role> {
        self.active_role
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_pending(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Token usage summed over successful replies since the role was selected
    pub fn usage_total(&self) -> Usage {
        self.usage
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// System prompt, then every prior turn in order, then the new message
    fn build_request(&self, role: &Role, text: &str) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(self.turns.len() + 2);
        messages.push(Message::system(role.system_prompt));
        messages.extend(self.turns.iter().map(Message::from));
        messages.push(Message::user(text));

        ChatCompletionRequest {
            model: self.options.model.clone(),
            messages,
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        }
    }
}

fn greeting(role: &Role) -> String {
    format!(
        "Hi! I'll be acting as \"{}\". {} How are you doing? How can I help?",
        role.name, role.description
    )
}

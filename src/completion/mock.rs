//! Demo backend used when no relay is configured

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::conversation::MessageRole;

use super::{ChatCompletionRequest, Completion, CompletionBackend, CompletionError, Usage};

const DEMO_REPLIES: [&str; 4] = [
    "This is a demo reply from the AI. Configure a relay with an API key for real answers.",
    "Thanks for your message! Once the API key is configured I can give more detailed answers.",
    "Interesting question! After the API is set up I will answer it with a real language model.",
    "I understand your request. Add an API key to get full answers from the AI.",
];

/// Cycles through canned replies, noting the active persona when one is set
#[derive(Debug, Default)]
pub struct MockBackend {
    next: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<Completion, CompletionError> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % DEMO_REPLIES.len();
        let mut content = DEMO_REPLIES[index].to_string();

        let system = request
            .messages
            .iter()
            .find(|m| m.role == MessageRole::System);
        if let Some(system) = system {
            let first_sentence = system.content.split('.').next().unwrap_or_default();
            content.push_str(&format!("\n\n(Active role: {})", first_sentence));
        }

        Ok(Completion {
            content,
            usage: Some(Usage::default()),
        })
    }

    async fn list_models(&self) -> Result<Vec<String>, CompletionError> {
        Err(CompletionError::NotConfigured(
            "demo mode has no upstream".to_string(),
        ))
    }
}

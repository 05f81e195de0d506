//! Model implementations for Caseforge.
//!
//! This crate provides concrete implementations of the `Model` trait.
//!
//! # Supported Providers
//!
//! - **Mock**: Testing and development (canned responses, no network)
//! - **OpenAI**: OpenAI's chat models (API key required)

pub mod factory;
pub mod openai;

use std::collections::VecDeque;

use async_trait::async_trait;
use caseforge_abstraction::{ChatMessage, Completion, CompletionParams, Model, ModelError, TokenUsage};
use tokio::sync::Mutex;
use tracing::debug;

pub use factory::{ModelConfig, ModelFactory, ModelType};
pub use openai::OpenAiModel;

/// A mock implementation of the `Model` trait for testing and development.
///
/// When constructed with `with_responses`, each completion pops the next
/// canned response off the queue; once the queue is empty (or when built
/// with `new`), completions fall back to a deterministic echo of the
/// conversation.
#[derive(Debug, Default)]
pub struct MockModel {
    id: String,
    responses: Mutex<VecDeque<String>>,
}

impl MockModel {
    /// Creates a new `MockModel` with the given ID.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self { id, responses: Mutex::new(VecDeque::new()) }
    }

    /// Creates a `MockModel` that replays the given responses in order.
    #[must_use]
    pub fn with_responses(id: String, responses: Vec<String>) -> Self {
        Self { id, responses: Mutex::new(responses.into()) }
    }
}

#[async_trait]
impl Model for MockModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: Option<CompletionParams>,
    ) -> Result<Completion, ModelError> {
        debug!(
            model_id = %self.id,
            message_count = messages.len(),
            params = ?params,
            "MockModel generating completion"
        );

        let content = match self.responses.lock().await.pop_front() {
            Some(canned) => canned,
            None => {
                let mut summary = format!("Mock completion from {}\n", self.id);
                for message in messages {
                    summary.push_str(&format!("  {}: {}\n", message.role, message.content));
                }
                summary
            }
        };

        let prompt_tokens = messages.iter().map(|m| count_tokens(&m.content)).sum::<u32>();
        let completion_tokens = count_tokens(&content);

        Ok(Completion {
            content,
            model_id: Some(self.id.clone()),
            usage: Some(TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
        })
    }

    fn model_id(&self) -> &str {
        &self.id
    }
}

/// Count tokens in a string (simplified: word count).
///
/// For a real implementation, this would use a proper tokenizer.
#[allow(clippy::cast_possible_truncation)]
fn count_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_model_echoes_without_script() {
        let model = MockModel::new("mock-model".to_string());
        let messages = vec![ChatMessage::user("hello")];

        let completion = model.complete(&messages, None).await.unwrap();
        assert!(completion.content.contains("hello"));
        assert_eq!(completion.model_id, Some("mock-model".to_string()));
    }

    #[tokio::test]
    async fn test_mock_model_replays_responses_in_order() {
        let model = MockModel::with_responses(
            "mock-model".to_string(),
            vec!["first".to_string(), "second".to_string()],
        );
        let messages = vec![ChatMessage::user("anything")];

        let first = model.complete(&messages, None).await.unwrap();
        assert_eq!(first.content, "first");

        let second = model.complete(&messages, None).await.unwrap();
        assert_eq!(second.content, "second");

        // Queue exhausted, falls back to echo
        let third = model.complete(&messages, None).await.unwrap();
        assert!(third.content.contains("anything"));
    }

    #[tokio::test]
    async fn test_mock_model_reports_usage() {
        let model = MockModel::with_responses("mock-model".to_string(), vec!["a b c".to_string()]);
        let messages = vec![ChatMessage::user("one two")];

        let completion = model.complete(&messages, None).await.unwrap();
        let usage = completion.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 2);
        assert_eq!(usage.completion_tokens, 3);
        assert_eq!(usage.total_tokens, 5);
    }
}

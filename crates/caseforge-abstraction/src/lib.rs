//! Model abstraction layer for Caseforge.
//!
//! The pipeline treats the LLM as an opaque text-completion collaborator:
//! a sequence of role-tagged messages goes in, generated text comes out.
//! This crate defines that contract so the orchestrator never depends on a
//! concrete provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents an error that can occur when requesting a completion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// An error occurred during the API request (e.g., network issues, invalid request).
    #[error("Request error: {0}")]
    Request(String),

    /// The provider returned an error or an unusable response body.
    #[error("Model response error: {0}")]
    Response(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The model provider is not supported or configured.
    #[error("Unsupported model provider: {0}")]
    UnsupportedProvider(String),

    /// Other unexpected errors.
    #[error("Model error: {0}")]
    Other(String),
}

/// A message in a conversation with a chat model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender ("system", "user", "assistant").
    pub role: String,
    /// The content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Parameters controlling a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionParams {
    /// Sampling temperature. Low values keep generated test cases stable.
    pub temperature: Option<f32>,

    /// The maximum number of tokens to generate.
    pub max_output_tokens: Option<u32>,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self { temperature: Some(0.1), max_output_tokens: Some(4000) }
    }
}

/// The response from a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text.
    pub content: String,

    /// Optional: the ID of the model that produced the response.
    pub model_id: Option<String>,

    /// Optional: usage statistics for the request.
    pub usage: Option<TokenUsage>,
}

/// Usage statistics for a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,

    /// Number of tokens in the completion.
    pub completion_tokens: u32,

    /// Total number of tokens used.
    pub total_tokens: u32,
}

/// A trait for requesting text completions from an LLM provider.
///
/// All models must be `Send + Sync` to allow concurrent use across threads;
/// the analyze stage issues several completions at once against one model.
#[async_trait]
pub trait Model: Send + Sync {
    /// Generates a completion for the given conversation.
    ///
    /// # Arguments
    /// * `messages` - The conversation as a slice of chat messages
    /// * `params` - Optional parameters to control generation
    ///
    /// # Errors
    /// Returns a `ModelError` if the completion fails.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: Option<CompletionParams>,
    ) -> Result<Completion, ModelError>;

    /// Returns the ID of the model.
    fn model_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructors() {
        let system = ChatMessage::system("you are a QA analyst");
        assert_eq!(system.role, "system");
        assert_eq!(system.content, "you are a QA analyst");

        let user = ChatMessage::user("analyze this");
        assert_eq!(user.role, "user");
        assert_eq!(user.content, "analyze this");
    }

    #[test]
    fn test_completion_params_default() {
        let params = CompletionParams::default();
        assert_eq!(params.temperature, Some(0.1));
        assert_eq!(params.max_output_tokens, Some(4000));
    }

    #[test]
    fn test_model_error_display() {
        let err = ModelError::UnsupportedProvider("acme".to_string());
        assert_eq!(err.to_string(), "Unsupported model provider: acme");

        let err = ModelError::Request("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}

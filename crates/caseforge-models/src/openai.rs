//! OpenAI model implementation.
//!
//! This module provides an implementation of the `Model` trait over OpenAI's
//! chat completions API, including OpenAI-compatible endpoints via a custom
//! base URL.

use async_trait::async_trait;
use caseforge_abstraction::{
    ChatMessage, Completion, CompletionParams, Model, ModelError, TokenUsage,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI model implementation.
#[derive(Debug, Clone)]
pub struct OpenAiModel {
    /// The model ID (e.g., "gpt-4", "gpt-4o-mini").
    model_id: String,
    /// The API key for authentication.
    api_key: String,
    /// The base URL for the API.
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl OpenAiModel {
    /// Creates a new `OpenAiModel` with the given model ID.
    ///
    /// # Arguments
    /// * `model_id` - The OpenAI model ID to use (e.g., "gpt-4")
    ///
    /// # Errors
    /// Returns a `ModelError` if the `OPENAI_API_KEY` environment variable is not set.
    pub fn new(model_id: String) -> Result<Self, ModelError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            ModelError::UnsupportedProvider(
                "OPENAI_API_KEY environment variable not set".to_string(),
            )
        })?;

        Ok(Self::with_api_key(model_id, api_key))
    }

    /// Creates a new `OpenAiModel` with an explicit API key.
    ///
    /// # Arguments
    /// * `model_id` - The OpenAI model ID to use
    /// * `api_key` - The API key for authentication
    #[must_use]
    pub fn with_api_key(model_id: String, api_key: String) -> Self {
        Self { model_id, api_key, base_url: DEFAULT_BASE_URL.to_string(), client: Client::new() }
    }

    /// Overrides the base URL, for OpenAI-compatible endpoints.
    ///
    /// # Arguments
    /// * `base_url` - The endpoint base (e.g., "http://localhost:8000/v1")
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl Model for OpenAiModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: Option<CompletionParams>,
    ) -> Result<Completion, ModelError> {
        debug!(
            model_id = %self.model_id,
            message_count = messages.len(),
            params = ?params,
            "OpenAiModel generating completion"
        );

        let url = format!("{}/chat/completions", self.base_url);

        let api_messages: Vec<ApiMessage> = messages
            .iter()
            .map(|msg| ApiMessage { role: msg.role.clone(), content: msg.content.clone() })
            .collect();

        let mut request_body = ApiRequest {
            model: self.model_id.clone(),
            messages: api_messages,
            temperature: None,
            max_tokens: None,
        };

        if let Some(params) = params {
            request_body.temperature = params.temperature;
            request_body.max_tokens = params.max_output_tokens;
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to OpenAI API");
                ModelError::Request(format!("Network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                status = %status,
                error = %error_text,
                "OpenAI API returned error status"
            );
            return Err(ModelError::Response(format!("API error ({}): {}", status, error_text)));
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse OpenAI API response");
            ModelError::Serialization(format!("Failed to parse response: {}", e))
        })?;

        let content = api_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| {
                error!("No content in OpenAI API response");
                ModelError::Response("No content in API response".to_string())
            })?;

        let usage = api_response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(Completion { content, model_id: Some(self.model_id.clone()), usage })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// OpenAI API request/response structures

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)] // Matches API naming
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_model_creation_with_api_key() {
        let model = OpenAiModel::with_api_key("gpt-4".to_string(), "test-key".to_string());
        assert_eq!(model.model_id(), "gpt-4");
        assert_eq!(model.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_openai_model_base_url_override() {
        let model = OpenAiModel::with_api_key("local".to_string(), "none".to_string())
            .with_base_url("http://localhost:8000/v1".to_string());
        assert_eq!(model.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn test_request_body_omits_unset_params() {
        let request = ApiRequest {
            model: "gpt-4".to_string(),
            messages: vec![ApiMessage { role: "user".to_string(), content: "hi".to_string() }],
            temperature: None,
            max_tokens: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("max_tokens"));
    }
}

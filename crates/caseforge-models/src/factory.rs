//! Model factory for creating model instances from a run's provider selection.
//!
//! Runs carry a provider name and model ID chosen at ingestion time; the
//! factory turns that pair into a usable `Model` instance, loading API keys
//! from the environment when not supplied explicitly.

use crate::{MockModel, OpenAiModel};
use caseforge_abstraction::{Model, ModelError};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error};

/// Model type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// Mock model for testing and offline development.
    Mock,
    /// OpenAI chat model.
    OpenAi,
}

impl FromStr for ModelType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "openai" => Ok(Self::OpenAi),
            _ => Err(()),
        }
    }
}

/// Model configuration.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// The type of model to create.
    pub model_type: ModelType,
    /// The model ID (e.g., "gpt-4", "gpt-4o-mini").
    pub model_id: String,
    /// Optional API key (if not provided, will be loaded from the environment).
    pub api_key: Option<String>,
    /// Optional base URL for OpenAI-compatible endpoints.
    pub base_url: Option<String>,
}

impl ModelConfig {
    /// Creates a new `ModelConfig` with the given type and model ID.
    ///
    /// # Arguments
    /// * `model_type` - The type of model
    /// * `model_id` - The model ID
    #[must_use]
    pub fn new(model_type: ModelType, model_id: String) -> Self {
        Self { model_type, model_id, api_key: None, base_url: None }
    }

    /// Sets the API key for this configuration.
    #[must_use]
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Sets the base URL for this configuration.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }
}

/// Factory for creating model instances.
pub struct ModelFactory;

impl ModelFactory {
    /// Creates a model instance from the given configuration.
    ///
    /// # Arguments
    /// * `config` - The model configuration
    ///
    /// # Errors
    /// Returns a `ModelError` if model creation fails (e.g., missing API key).
    pub fn create(config: ModelConfig) -> Result<Arc<dyn Model>, ModelError> {
        debug!(
            model_type = ?config.model_type,
            model_id = %config.model_id,
            "Creating model instance"
        );

        match config.model_type {
            ModelType::Mock => Ok(Arc::new(MockModel::new(config.model_id))),
            ModelType::OpenAi => {
                let model = if let Some(api_key) = config.api_key {
                    OpenAiModel::with_api_key(config.model_id, api_key)
                } else {
                    OpenAiModel::new(config.model_id)?
                };
                let model = if let Some(base_url) = config.base_url {
                    model.with_base_url(base_url)
                } else {
                    model
                };
                Ok(Arc::new(model))
            }
        }
    }

    /// Creates a model instance from a provider name and model ID.
    ///
    /// # Arguments
    /// * `provider` - String representation of the provider ("mock", "openai")
    /// * `model_id` - The model ID
    ///
    /// # Errors
    /// Returns a `ModelError` if the provider is unrecognized or creation fails.
    pub fn create_from_str(provider: &str, model_id: String) -> Result<Arc<dyn Model>, ModelError> {
        let model_type = ModelType::from_str(provider).map_err(|()| {
            error!(provider = %provider, "Unrecognized model provider");
            ModelError::UnsupportedProvider(provider.to_string())
        })?;

        Self::create(ModelConfig::new(model_type, model_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_from_str() {
        assert_eq!(ModelType::from_str("mock"), Ok(ModelType::Mock));
        assert_eq!(ModelType::from_str("Mock"), Ok(ModelType::Mock));
        assert_eq!(ModelType::from_str("openai"), Ok(ModelType::OpenAi));
        assert_eq!(ModelType::from_str("OPENAI"), Ok(ModelType::OpenAi));
        assert_eq!(ModelType::from_str("gemini"), Err(()));
    }

    #[test]
    fn test_model_config_builder() {
        let config = ModelConfig::new(ModelType::Mock, "test-model".to_string());
        assert_eq!(config.model_type, ModelType::Mock);
        assert_eq!(config.model_id, "test-model");
        assert_eq!(config.api_key, None);

        let config = config.with_api_key("test-key".to_string());
        assert_eq!(config.api_key, Some("test-key".to_string()));
    }

    #[test]
    fn test_factory_create_mock() {
        let config = ModelConfig::new(ModelType::Mock, "test-mock".to_string());
        let model = ModelFactory::create(config).unwrap();
        assert_eq!(model.model_id(), "test-mock");
    }

    #[test]
    fn test_factory_create_openai_with_api_key() {
        let config = ModelConfig::new(ModelType::OpenAi, "gpt-4".to_string())
            .with_api_key("test-key".to_string());
        let model = ModelFactory::create(config).unwrap();
        assert_eq!(model.model_id(), "gpt-4");
    }

    #[test]
    fn test_factory_create_unsupported_provider() {
        let result = ModelFactory::create_from_str("acme", "model".to_string());
        assert!(matches!(result, Err(ModelError::UnsupportedProvider(p)) if p == "acme"));
    }
}

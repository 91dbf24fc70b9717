//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{CasebookError, Result};
use crate::openai::{api_key_from_env, create_client, DEFAULT_TIMEOUT_SECS};
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder around an existing client.
    pub fn new(client: Client<OpenAIConfig>, model: &str, dimensions: usize) -> Self {
        Self {
            client,
            model: model.to_string(),
            dimensions,
        }
    }

    /// Create an embedder from settings, reading the API key from the environment.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = api_key_from_env(&settings.api_key_env)?;
        let client = create_client(
            &api_key,
            settings.api_base.as_deref(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )?;
        Ok(Self::new(client, &settings.model, settings.dimensions as usize))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::String(text.to_string()))
            .dimensions(self.dimensions as u32)
            .build()
            .map_err(|e| CasebookError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| CasebookError::OpenAI(format!("Embedding API error: {}", e)))?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| CasebookError::Embedding("Empty embedding response".to_string()))?;

        if embedding.len() != self.dimensions {
            return Err(CasebookError::Embedding(format!(
                "Expected {} dimensions, got {}",
                self.dimensions,
                embedding.len()
            )));
        }

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

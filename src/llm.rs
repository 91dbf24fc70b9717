//! Hosted LLM boundary.
//!
//! [`LlmClient::complete_stream`] returns a lazy, finite, non-restartable
//! stream of text tokens. Consumers decide what to do with each token; this
//! module never touches presentation.

use crate::config::LlmSettings;
use crate::error::{CasebookError, Result};
use crate::openai::{api_key_from_env, create_client};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use futures::{future, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Stream of generated text fragments.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Trait for chat completion backends.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Model identifier used for requests.
    fn model(&self) -> &str;

    /// Start a streamed completion.
    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<TokenStream>;

    /// Cheap request confirming the endpoint and credentials work.
    async fn probe(&self) -> Result<()>;
}

/// Client for OpenAI-compatible chat endpoints (Groq by default).
pub struct OpenAIChatClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIChatClient {
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    /// Build a client from settings, reading the API key from the environment.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = api_key_from_env(&settings.api_key_env)?;
        let client = create_client(
            &api_key,
            Some(settings.api_base.as_str()),
            Duration::from_secs(settings.timeout_seconds),
        )?;
        Ok(Self::new(client, &settings.model))
    }

    fn convert(messages: &[ChatMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
        messages
            .iter()
            .map(|m| {
                let converted: ChatCompletionRequestMessage = match m.role {
                    Role::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map_err(|e| CasebookError::Generation(e.to_string()))?
                        .into(),
                    Role::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map_err(|e| CasebookError::Generation(e.to_string()))?
                        .into(),
                    Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map_err(|e| CasebookError::Generation(e.to_string()))?
                        .into(),
                };
                Ok(converted)
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for OpenAIChatClient {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<TokenStream> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::convert(messages)?)
            .stream(true)
            .build()
            .map_err(|e| CasebookError::Generation(format!("Failed to build request: {}", e)))?;

        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| CasebookError::OpenAI(format!("Chat API error: {}", e)))?;

        debug!("Streaming completion started");

        let tokens = stream.filter_map(|item| {
            future::ready(match item {
                Ok(response) => response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                    .filter(|token| !token.is_empty())
                    .map(Ok),
                Err(e) => Some(Err(CasebookError::Generation(format!("Stream error: {}", e)))),
            })
        });

        Ok(Box::pin(tokens))
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn probe(&self) -> Result<()> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::convert(&[ChatMessage::user("test")])?)
            .max_completion_tokens(10u32)
            .build()
            .map_err(|e| CasebookError::Generation(format!("Failed to build request: {}", e)))?;

        self.client
            .chat()
            .create(request)
            .await
            .map_err(|e| CasebookError::OpenAI(format!("Connection check failed: {}", e)))?;

        info!("LLM endpoint reachable");
        Ok(())
    }
}

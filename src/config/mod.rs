//! Configuration module for Casebook.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts, FALLBACK_ANSWER};
pub use settings::{
    ChunkingSettings, EmbeddingProvider, EmbeddingSettings, LlmSettings, PromptSettings,
    RagSettings, Settings, SourceSettings, VectorStoreSettings,
};

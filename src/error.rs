//! Error types for Casebook.

use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type for Casebook operations.
#[derive(Error, Debug)]
pub enum CasebookError {
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Failed to parse input: {0}")]
    Parse(String),

    #[error("Components are not loaded: {0}")]
    ComponentsUnavailable(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for Casebook operations.
pub type Result<T> = std::result::Result<T, CasebookError>;

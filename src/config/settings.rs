//! Configuration settings for Casebook.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub source: SourceSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub llm: LlmSettings,
    pub rag: RagSettings,
    pub prompts: PromptSettings,
}

/// Locations of the source document and the intermediate artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// The PDF to extract.
    pub pdf_path: String,
    /// Raw text written by `extract`, read by `chunk`.
    pub raw_text_path: String,
    /// JSON chunk file written by `chunk`, read by `index`.
    pub chunks_path: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            pdf_path: "Health-Case-Studies-1654543959.pdf".to_string(),
            raw_text_path: "full_book_raw.txt".to_string(),
            chunks_path: "cases_database.json".to_string(),
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Everything before the first occurrence of this marker is discarded.
    pub start_marker: String,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            start_marker: "Case Study #1: Chronic Obstructive Pulmonary".to_string(),
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hosted OpenAI-compatible embeddings endpoint.
    #[default]
    OpenAI,
    /// Local feature-hashing embedder (no network, lower quality).
    Hashing,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingProvider::OpenAI),
            "hashing" | "hash" | "local" => Ok(EmbeddingProvider::Hashing),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::OpenAI => write!(f, "openai"),
            EmbeddingProvider::Hashing => write!(f, "hashing"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai, hashing).
    pub provider: EmbeddingProvider,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Environment variable holding the embeddings API key.
    pub api_key_env: String,
    /// Override for the embeddings API base URL.
    pub api_base: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAI,
            model: "text-embedding-3-small".to_string(),
            dimensions: 384,
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_base: None,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Directory holding the persistent store.
    pub path: String,
    /// Name of the collection built by `index`.
    pub collection: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            path: "./cases_db".to_string(),
            collection: "medical_cases".to_string(),
        }
    }
}

/// Hosted LLM settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model used for answers.
    pub model: String,
    /// OpenAI-compatible API base URL.
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Send a tiny completion at startup to check the key and endpoint.
    pub verify_on_start: bool,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "llama-3.1-8b-instant".to_string(),
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            verify_on_start: true,
            timeout_seconds: 300,
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Upper bound on the assembled context, in characters.
    pub max_context_chars: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_context_chars: 24_000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::CasebookError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("casebook")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    pub fn pdf_path(&self) -> PathBuf {
        Self::expand_path(&self.source.pdf_path)
    }

    pub fn raw_text_path(&self) -> PathBuf {
        Self::expand_path(&self.source.raw_text_path)
    }

    pub fn chunks_path(&self) -> PathBuf {
        Self::expand_path(&self.source.chunks_path)
    }

    /// Get the expanded vector store directory.
    pub fn store_dir(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.path)
    }

    /// SQLite database file inside the store directory.
    pub fn sqlite_path(&self) -> PathBuf {
        self.store_dir().join("vectors.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.rag.top_k, 5);
        assert_eq!(settings.vector_store.collection, "medical_cases");
        assert_eq!(settings.llm.api_key_env, "GROQ_API_KEY");
        assert!(settings.sqlite_path().ends_with("cases_db/vectors.db"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [rag]
            top_k = 3

            [embedding]
            provider = "hashing"
            "#,
        )
        .unwrap();

        assert_eq!(settings.rag.top_k, 3);
        assert_eq!(settings.rag.max_context_chars, 24_000);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::Hashing);
        assert_eq!(settings.llm.model, "llama-3.1-8b-instant");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.vector_store.collection = "other".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.vector_store.collection, "other");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.source.chunks_path, "cases_database.json");
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("OpenAI".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::OpenAI);
        assert_eq!("local".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Hashing);
        assert!("bert".parse::<EmbeddingProvider>().is_err());
    }
}

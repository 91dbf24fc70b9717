//! Pre-flight checks before expensive operations.
//!
//! Validates that input files and API keys are available before starting
//! operations that would otherwise fail midway.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::{CasebookError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Indexing requires the chunk file and, for hosted embeddings, an API key.
    Index,
    /// Search requires the vector store and the embedding key.
    Search,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Index => {
            check_embedding_key(settings)?;
        }
        Operation::Search => {
            let store = settings.sqlite_path();
            if !store.exists() {
                return Err(CasebookError::InputNotFound(store));
            }
            check_embedding_key(settings)?;
        }
    }
    Ok(())
}

fn check_embedding_key(settings: &Settings) -> Result<()> {
    match settings.embedding.provider {
        EmbeddingProvider::OpenAI => check_api_key(&settings.embedding.api_key_env),
        EmbeddingProvider::Hashing => Ok(()),
    }
}

/// Check that an API key environment variable is set and non-empty.
fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(CasebookError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(CasebookError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashing_settings() -> Settings {
        let mut settings = Settings::default();
        settings.embedding.provider = EmbeddingProvider::Hashing;
        settings
    }

    #[test]
    fn test_index_with_local_embeddings_needs_no_key() {
        assert!(check(Operation::Index, &hashing_settings()).is_ok());
    }

    #[test]
    fn test_missing_key_is_reported() {
        let mut settings = Settings::default();
        settings.embedding.api_key_env = "CASEBOOK_TEST_NO_EMBED_KEY_91af".to_string();
        assert!(matches!(
            check(Operation::Index, &settings),
            Err(CasebookError::Config(_))
        ));
    }

    #[test]
    fn test_search_requires_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = hashing_settings();
        settings.vector_store.path = dir.path().join("cases_db").to_string_lossy().to_string();

        assert!(matches!(
            check(Operation::Search, &settings),
            Err(CasebookError::InputNotFound(_))
        ));
    }
}

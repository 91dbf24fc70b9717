//! Heavy components shared by every query of a process.

use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{CasebookError, Result};
use crate::llm::{LlmClient, OpenAIChatClient};
use crate::vector_store::{SqliteVectorStore, VectorStore};
use std::sync::Arc;
use tracing::{info, instrument};

/// Embedder, vector store handle, LLM client and prompts.
///
/// Built once at startup and shared read-only across turns.
pub struct Components {
    pub store: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn Embedder>,
    pub llm: Arc<dyn LlmClient>,
    pub prompts: Prompts,
    pub collection: String,
}

impl Components {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmClient>,
        prompts: Prompts,
        collection: &str,
    ) -> Self {
        Self {
            store,
            embedder,
            llm,
            prompts,
            collection: collection.to_string(),
        }
    }

    /// Open the persisted store and build the hosted clients.
    ///
    /// Fails with `ComponentsUnavailable` if the store or collection is
    /// missing, a client cannot be built, or the startup probe fails.
    #[instrument(skip_all)]
    pub async fn load(settings: &Settings) -> Result<Self> {
        Self::build(settings).await.map_err(|e| match e {
            CasebookError::ComponentsUnavailable(_) => e,
            other => CasebookError::ComponentsUnavailable(other.to_string()),
        })
    }

    async fn build(settings: &Settings) -> Result<Self> {
        let collection = &settings.vector_store.collection;

        let store = Arc::new(SqliteVectorStore::open_existing(&settings.sqlite_path())?);
        let info = store.collection_info(collection).await?.ok_or_else(|| {
            CasebookError::ComponentsUnavailable(format!(
                "Collection '{}' does not exist, run `casebook index` first",
                collection
            ))
        })?;
        info!("Loaded collection {} ({} chunks)", info.name, info.chunk_count);

        let embedder = create_embedder(&settings.embedding)?;

        let llm = OpenAIChatClient::from_settings(&settings.llm)?;
        if settings.llm.verify_on_start {
            llm.probe().await?;
        }
        info!("Using model {}", llm.model());

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self::new(store, embedder, Arc::new(llm), prompts, collection))
    }
}

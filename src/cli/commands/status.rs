//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::{SqliteVectorStore, VectorStore};
use anyhow::Result;
use std::path::Path;

/// Run the status command.
pub async fn run_status(settings: &Settings) -> Result<()> {
    Output::header("Artifacts");
    artifact("PDF", &settings.pdf_path());
    artifact("Raw text", &settings.raw_text_path());
    artifact("Chunks", &settings.chunks_path());

    Output::header("Collection");
    let db_path = settings.sqlite_path();
    Output::kv("Store", &db_path.display().to_string());
    Output::kv("Name", &settings.vector_store.collection);

    if !db_path.exists() {
        Output::warning("No vector store yet. Run 'casebook index'.");
        return Ok(());
    }

    let store = SqliteVectorStore::open_existing(&db_path)?;
    match store.collection_info(&settings.vector_store.collection).await? {
        Some(info) => {
            Output::kv("Chunks", &info.chunk_count.to_string());
            Output::kv(
                "Dimensions",
                &info
                    .dimensions
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            );
            Output::kv("Built", &info.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
        }
        None => Output::warning("Collection does not exist. Run 'casebook index'."),
    }

    Ok(())
}

fn artifact(label: &str, path: &Path) {
    let state = if path.exists() { "present" } else { "missing" };
    Output::kv(label, &format!("{} ({})", path.display(), state));
}

//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::create_embedder;
use crate::rag::retrieve;
use crate::vector_store::SqliteVectorStore;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'casebook index' to build the collection first.");
        return Err(e.into());
    }

    let store = SqliteVectorStore::open_existing(&settings.sqlite_path())?;
    let embedder = create_embedder(&settings.embedding)?;

    let spinner = Output::spinner("Searching...");
    let results = retrieve(
        &store,
        embedder.as_ref(),
        &settings.vector_store.collection,
        query,
        limit,
    )
    .await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::warning("No results found. Is the collection empty?");
            } else {
                Output::success(&format!("Found {} results", results.len()));
                for (i, result) in results.iter().enumerate() {
                    Output::search_result(i + 1, &result.chunk.id, result.score, &result.chunk.text);
                }
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            Err(e.into())
        }
    }
}

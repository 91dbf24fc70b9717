//! Index command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::create_embedder;
use crate::indexing::Indexer;
use crate::vector_store::SqliteVectorStore;
use anyhow::Result;
use std::sync::Arc;

/// Run the index command.
pub async fn run_index(input: Option<String>, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Index, settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let chunks_path = input
        .map(|p| Settings::expand_path(&p))
        .unwrap_or_else(|| settings.chunks_path());

    let store = Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?);
    let embedder = create_embedder(&settings.embedding)?;
    let indexer = Indexer::new(store, embedder, &settings.vector_store.collection);

    Output::info(&format!(
        "Indexing {} into collection '{}'",
        chunks_path.display(),
        settings.vector_store.collection
    ));

    let pb = Output::progress_bar(0, "chunks");
    let result = indexer
        .index_file(&chunks_path, |done, total| {
            if done == 1 {
                pb.set_length(total as u64);
            }
            pb.set_position(done as u64);
        })
        .await;
    pb.finish_and_clear();

    match result {
        Ok(report) => {
            if report.replaced_previous {
                Output::info("Replaced the previous collection");
            }
            Output::success(&format!(
                "Indexed {} chunks into '{}'",
                report.chunks_indexed, report.collection
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Indexing failed: {}", e));
            Err(e.into())
        }
    }
}

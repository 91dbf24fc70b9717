//! Chunk command implementation.

use crate::chunking::Chunker;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::CasebookError;
use anyhow::Result;

/// Run the chunk command.
///
/// A missing raw text file is reported and treated as a no-op.
pub fn run_chunk(input: Option<String>, output: Option<String>, settings: &Settings) -> Result<()> {
    let raw = input
        .map(|p| Settings::expand_path(&p))
        .unwrap_or_else(|| settings.raw_text_path());
    let chunks_path = output
        .map(|p| Settings::expand_path(&p))
        .unwrap_or_else(|| settings.chunks_path());

    let chunker = Chunker::new(&settings.chunking);

    match chunker.chunk_file(&raw, &chunks_path) {
        Ok(outcome) => {
            if !outcome.start_marker_found {
                Output::warning(&format!(
                    "Start marker '{}' not found, chunked the whole text",
                    settings.chunking.start_marker
                ));
            }
            Output::success(&format!(
                "Wrote {} chunks to {}",
                outcome.chunks.len(),
                chunks_path.display()
            ));
            Ok(())
        }
        Err(CasebookError::InputNotFound(path)) => {
            Output::error(&format!(
                "{} not found. Run 'casebook extract' first.",
                path.display()
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Chunking failed: {}", e));
            Err(e.into())
        }
    }
}

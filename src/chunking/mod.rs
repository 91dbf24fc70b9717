//! Text cleaning and chunking.
//!
//! Turns the raw extracted text into an ordered list of overlapping chunks
//! with stable `chunk_<n>` ids, and reads/writes the JSON chunk file that sits
//! between chunking and indexing.

mod cleaner;
mod splitter;

pub use cleaner::{CleanedText, TextCleaner};
pub use splitter::{RecursiveSplitter, DEFAULT_SEPARATORS};

use crate::config::ChunkingSettings;
use crate::error::{CasebookError, Result};
use crate::fs_util::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument};

/// Number of leading characters used as a chunk's source locator.
const SOURCE_LOCATOR_CHARS: usize = 50;

/// A bounded slice of source text stored as one retrievable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable id, `chunk_<n>` with `n` starting at 1.
    pub id: String,
    /// Text content of this chunk.
    pub text: String,
}

impl Chunk {
    pub fn new(position: usize, text: String) -> Self {
        Self {
            id: format!("chunk_{}", position),
            text,
        }
    }

    /// Short human-readable pointer to where the chunk came from.
    pub fn source_locator(&self) -> String {
        let prefix: String = self.text.chars().take(SOURCE_LOCATOR_CHARS).collect();
        format!("{}...", prefix)
    }

    /// Numeric position parsed back from the id, if it has the standard form.
    pub fn position(&self) -> Option<usize> {
        self.id.strip_prefix("chunk_")?.parse().ok()
    }
}

/// Output of a chunking run.
#[derive(Debug, Clone)]
pub struct ChunkingOutcome {
    pub chunks: Vec<Chunk>,
    pub start_marker_found: bool,
}

/// Cleans raw text and splits it into chunks.
pub struct Chunker {
    cleaner: TextCleaner,
    splitter: RecursiveSplitter,
}

impl Chunker {
    pub fn new(settings: &ChunkingSettings) -> Self {
        Self {
            cleaner: TextCleaner::new(&settings.start_marker),
            splitter: RecursiveSplitter::new(settings.chunk_size, settings.chunk_overlap),
        }
    }

    /// Clean and split raw text. Deterministic for identical input.
    #[instrument(skip_all, fields(raw_len = raw_text.len()))]
    pub fn chunk(&self, raw_text: &str) -> ChunkingOutcome {
        let cleaned = self.cleaner.clean(raw_text);

        let chunks: Vec<Chunk> = self
            .splitter
            .split(&cleaned.text)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk::new(i + 1, text))
            .collect();

        info!("Split text into {} chunks", chunks.len());

        ChunkingOutcome {
            chunks,
            start_marker_found: cleaned.start_marker_found,
        }
    }

    /// Read the raw text file, chunk it and write the JSON chunk file.
    ///
    /// A missing input file yields `InputNotFound` and nothing is written.
    pub fn chunk_file(&self, input: &Path, output: &Path) -> Result<ChunkingOutcome> {
        if !input.exists() {
            return Err(CasebookError::InputNotFound(input.to_path_buf()));
        }

        info!("Reading raw text from {:?}", input);
        let raw = std::fs::read_to_string(input)?;
        let outcome = self.chunk(&raw);
        save_chunks(output, &outcome.chunks)?;
        Ok(outcome)
    }
}

/// Write chunks as a pretty-printed JSON array of `{id, text}` objects.
pub fn save_chunks(path: &Path, chunks: &[Chunk]) -> Result<()> {
    let json = serde_json::to_string_pretty(chunks)?;
    write_atomic(path, json.as_bytes())?;
    info!("Saved {} chunks to {:?}", chunks.len(), path);
    Ok(())
}

/// Load and validate a chunk file.
///
/// The file must hold a non-empty array of chunks with unique ids.
pub fn load_chunks(path: &Path) -> Result<Vec<Chunk>> {
    if !path.exists() {
        return Err(CasebookError::InputNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let chunks: Vec<Chunk> = serde_json::from_str(&content).map_err(|e| {
        CasebookError::Parse(format!("{} is not a valid chunk file: {}", path.display(), e))
    })?;

    if chunks.is_empty() {
        return Err(CasebookError::Parse(format!(
            "{} contains no chunks",
            path.display()
        )));
    }

    let mut seen = HashSet::new();
    for chunk in &chunks {
        if !seen.insert(chunk.id.as_str()) {
            return Err(CasebookError::Parse(format!(
                "Duplicate chunk id '{}' in {}",
                chunk.id,
                path.display()
            )));
        }
    }

    info!("Loaded {} chunks from {:?}", chunks.len(), path);
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> String {
        let mut raw = String::from(
            "Health Case Studies\nTable of Contents\n\
             Case Study #2: Asthma ..... 14\n--- End of Page ---\n",
        );
        raw.push_str("Case Study #1: Chronic Obstructive Pulmonary Disease\n");
        for i in 0..80 {
            raw.push_str(&format!(
                "Finding {} shows reduced airflow and the patient reports dyspnea on exertion. ",
                i
            ));
            if i % 10 == 9 {
                raw.push_str("\n--- End of Page ---\n 7 \n\n\n\n");
            }
        }
        raw
    }

    #[test]
    fn test_chunk_discards_front_matter() {
        let chunker = Chunker::new(&ChunkingSettings::default());
        let outcome = chunker.chunk(&book());

        assert!(outcome.start_marker_found);
        assert!(outcome.chunks[0]
            .text
            .starts_with("Case Study #1: Chronic Obstructive Pulmonary"));
        assert!(outcome.chunks.iter().all(|c| !c.text.contains("Table of Contents")));
        assert!(outcome.chunks.iter().all(|c| !c.text.contains("End of Page")));
    }

    #[test]
    fn test_chunk_ids_are_sequential_from_one() {
        let chunker = Chunker::new(&ChunkingSettings::default());
        let outcome = chunker.chunk(&book());

        assert!(outcome.chunks.len() > 2);
        for (i, chunk) in outcome.chunks.iter().enumerate() {
            assert_eq!(chunk.id, format!("chunk_{}", i + 1));
            assert_eq!(chunk.position(), Some(i + 1));
            assert!(chunk.text.chars().count() <= 1000);
        }
    }

    #[test]
    fn test_chunk_is_deterministic() {
        let chunker = Chunker::new(&ChunkingSettings::default());
        assert_eq!(chunker.chunk(&book()).chunks, chunker.chunk(&book()).chunks);
    }

    #[test]
    fn test_source_locator() {
        let chunk = Chunk::new(1, "ü".repeat(80));
        let locator = chunk.source_locator();
        assert_eq!(locator.chars().count(), 53);
        assert!(locator.ends_with("..."));

        let short = Chunk::new(2, "Brief".to_string());
        assert_eq!(short.source_locator(), "Brief...");
    }

    #[test]
    fn test_chunk_file_round_trip_preserves_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.txt");
        let output = dir.path().join("chunks.json");
        std::fs::write(
            &input,
            "Case Study #1: Chronic Obstructive Pulmonary\nPatient reports 38.5°C fever, café worker.",
        )
        .unwrap();

        let chunker = Chunker::new(&ChunkingSettings::default());
        let outcome = chunker.chunk_file(&input, &output).unwrap();
        assert_eq!(outcome.chunks.len(), 1);

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("°C fever, café"));
        assert!(written.contains("\n  {\n    \"id\": \"chunk_1\""));

        let loaded = load_chunks(&output).unwrap();
        assert_eq!(loaded, outcome.chunks);
    }

    #[test]
    fn test_chunk_file_missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("chunks.json");

        let chunker = Chunker::new(&ChunkingSettings::default());
        let err = chunker
            .chunk_file(&dir.path().join("missing.txt"), &output)
            .unwrap_err();

        assert!(matches!(err, CasebookError::InputNotFound(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_load_chunks_validation() {
        let dir = tempfile::tempdir().unwrap();

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "[]").unwrap();
        assert!(matches!(load_chunks(&empty), Err(CasebookError::Parse(_))));

        let dupes = dir.path().join("dupes.json");
        std::fs::write(
            &dupes,
            r#"[{"id": "chunk_1", "text": "a"}, {"id": "chunk_1", "text": "b"}]"#,
        )
        .unwrap();
        assert!(matches!(load_chunks(&dupes), Err(CasebookError::Parse(_))));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "{not json").unwrap();
        assert!(matches!(load_chunks(&garbage), Err(CasebookError::Parse(_))));

        assert!(matches!(
            load_chunks(&dir.path().join("absent.json")),
            Err(CasebookError::InputNotFound(_))
        ));
    }
}

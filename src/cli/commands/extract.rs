//! Extract command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::extraction::{extract_to_file, PROGRESS_INTERVAL};
use anyhow::Result;

/// Run the extract command.
pub fn run_extract(input: Option<String>, output: Option<String>, settings: &Settings) -> Result<()> {
    let pdf = input.map(|p| Settings::expand_path(&p)).unwrap_or_else(|| settings.pdf_path());
    let raw = output
        .map(|p| Settings::expand_path(&p))
        .unwrap_or_else(|| settings.raw_text_path());

    Output::info(&format!("Extracting text from {}", pdf.display()));

    let pb = Output::progress_bar(0, "pages");
    let result = extract_to_file(&pdf, &raw, |done, total| {
        if done == 1 {
            pb.set_length(total as u64);
        }
        if done % PROGRESS_INTERVAL == 0 || done == total {
            pb.set_position(done as u64);
        }
    });
    pb.finish_and_clear();

    match result {
        Ok(result) => {
            Output::success(&format!(
                "Extracted {} pages ({} characters) to {}",
                result.pages,
                result.characters,
                raw.display()
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Extraction failed: {}", e));
            Err(e.into())
        }
    }
}

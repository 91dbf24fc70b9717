//! Removes extraction noise from raw PDF text before splitting.

use crate::extraction::PAGE_MARKER;
use regex::Regex;
use tracing::{info, warn};

/// Cleans raw extracted text.
pub struct TextCleaner {
    start_marker: String,
    page_number_line: Regex,
    blank_run: Regex,
}

/// Result of cleaning.
#[derive(Debug, Clone)]
pub struct CleanedText {
    pub text: String,
    /// Whether the start-of-content marker was found and front matter dropped.
    pub start_marker_found: bool,
}

impl TextCleaner {
    pub fn new(start_marker: &str) -> Self {
        Self {
            start_marker: start_marker.to_string(),
            page_number_line: Regex::new(r"\n\s*\d+\s*\n").expect("Invalid regex"),
            blank_run: Regex::new(r"\n{3,}").expect("Invalid regex"),
        }
    }

    /// Drop front matter, page markers, page-number lines and blank-line runs.
    ///
    /// A missing start marker is not an error: the whole text is kept and a
    /// warning is logged.
    pub fn clean(&self, raw: &str) -> CleanedText {
        let (body, start_marker_found) = match self.find_start(raw) {
            Some(index) => {
                info!("Found start of content, ignoring table of contents");
                (&raw[index..], true)
            }
            None => {
                warn!(
                    "Could not find start marker {:?}, chunking entire text",
                    self.start_marker
                );
                (raw, false)
            }
        };

        let text = body.replace(PAGE_MARKER, "");
        let text = self.page_number_line.replace_all(&text, "\n");
        let text = self.blank_run.replace_all(&text, "\n\n");

        CleanedText {
            text: text.trim().to_string(),
            start_marker_found,
        }
    }

    fn find_start(&self, raw: &str) -> Option<usize> {
        if self.start_marker.is_empty() {
            return None;
        }
        raw.find(&self.start_marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "Case Study #1: Chronic Obstructive Pulmonary";

    #[test]
    fn test_drops_table_of_contents() {
        let raw = "Contents\nCase Study #1: Chronic Obstructive Pulmonary .... 3\n\
                   Case Study #2: Asthma .... 9\n--- End of Page ---\n\
                   Introduction text\n";
        // The marker's first occurrence is in the table of contents line
        let cleaner = TextCleaner::new(MARKER);
        let cleaned = cleaner.clean(raw);
        assert!(cleaned.start_marker_found);
        assert!(cleaned.text.starts_with(MARKER));
        assert!(!cleaned.text.contains("Contents"));
    }

    #[test]
    fn test_missing_marker_keeps_everything() {
        let cleaner = TextCleaner::new(MARKER);
        let cleaned = cleaner.clean("Preface\n\nSome body text.");
        assert!(!cleaned.start_marker_found);
        assert_eq!(cleaned.text, "Preface\n\nSome body text.");
    }

    #[test]
    fn test_strips_page_markers_and_numbers() {
        let raw = format!(
            "{} Disease\nA 67-year-old man.\n{}\n\n 12 \nHe smokes.\n\n\n\n\nPlan follows.",
            MARKER, PAGE_MARKER
        );
        let cleaner = TextCleaner::new(MARKER);
        let cleaned = cleaner.clean(&raw);

        assert!(!cleaned.text.contains(PAGE_MARKER));
        assert!(!cleaned.text.contains("12"));
        assert!(!cleaned.text.contains("\n\n\n"));
        assert!(cleaned.text.contains("He smokes.\n\nPlan follows."));
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let cleaner = TextCleaner::new("");
        let cleaned = cleaner.clean("\n\n  body  \n\n");
        assert_eq!(cleaned.text, "body");
    }
}

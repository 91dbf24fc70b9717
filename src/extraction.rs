//! PDF text extraction.
//!
//! Extracts the text of every page in order, appending a page marker after
//! each one, and writes the result in one shot once every page succeeded.

use crate::error::{CasebookError, Result};
use crate::fs_util::write_atomic;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Marker appended after each page's text. Removed again by the chunker.
pub const PAGE_MARKER: &str = "--- End of Page ---";

/// How often (in pages) progress is reported.
pub const PROGRESS_INTERVAL: usize = 20;

/// Summary of an extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub pages: usize,
    pub characters: usize,
}

/// Extracts text from a PDF document.
pub struct PdfExtractor {
    document: lopdf::Document,
    page_numbers: Vec<u32>,
}

impl PdfExtractor {
    /// Open a PDF for extraction.
    #[instrument]
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CasebookError::InputNotFound(path.to_path_buf()));
        }

        let document = lopdf::Document::load(path)
            .map_err(|e| CasebookError::Parse(format!("Failed to open PDF {:?}: {}", path, e)))?;
        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();

        info!("Opened PDF with {} pages", page_numbers.len());
        Ok(Self {
            document,
            page_numbers,
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    /// Extract every page, calling `on_page(done, total)` after each one.
    ///
    /// Any page failure aborts the whole extraction.
    pub fn extract<F>(&self, mut on_page: F) -> Result<String>
    where
        F: FnMut(usize, usize),
    {
        let total = self.page_numbers.len();
        let mut text = String::new();

        for (index, page_number) in self.page_numbers.iter().enumerate() {
            let page_text = self.document.extract_text(&[*page_number]).map_err(|e| {
                CasebookError::Parse(format!("Failed to extract page {}: {}", page_number, e))
            })?;

            text.push_str(&page_text);
            text.push('\n');
            text.push_str(PAGE_MARKER);
            text.push('\n');

            if (index + 1) % PROGRESS_INTERVAL == 0 {
                debug!("Processed page {}/{}", index + 1, total);
            }
            on_page(index + 1, total);
        }

        Ok(text)
    }
}

/// Extract a PDF to a text file. Nothing is written unless every page succeeds.
pub fn extract_to_file<F>(pdf: &Path, output: &Path, on_page: F) -> Result<ExtractionResult>
where
    F: FnMut(usize, usize),
{
    let extractor = PdfExtractor::open(pdf)?;
    let text = extractor.extract(on_page)?;

    write_atomic(output, text.as_bytes())?;
    info!("Wrote extracted text to {:?}", output);

    Ok(ExtractionResult {
        pages: extractor.page_count(),
        characters: text.chars().count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build a small PDF with one line of text per page.
    fn write_pdf(path: &Path, pages: &[&str]) {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for line in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_extract_pages_with_markers() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("book.pdf");
        let out = dir.path().join("raw.txt");
        write_pdf(&pdf, &["First page text", "Second page text"]);

        let mut progress = Vec::new();
        let result = extract_to_file(&pdf, &out, |done, total| progress.push((done, total))).unwrap();

        assert_eq!(result.pages, 2);
        assert_eq!(progress, vec![(1, 2), (2, 2)]);

        let raw = std::fs::read_to_string(&out).unwrap();
        assert_eq!(raw.matches(PAGE_MARKER).count(), 2);
        let first = raw.find("First page text").unwrap();
        let second = raw.find("Second page text").unwrap();
        assert!(first < raw.find(PAGE_MARKER).unwrap());
        assert!(second > raw.find(PAGE_MARKER).unwrap());
    }

    #[test]
    fn test_missing_pdf_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("raw.txt");

        let err = extract_to_file(&dir.path().join("absent.pdf"), &out, |_, _| {}).unwrap_err();
        assert!(matches!(err, CasebookError::InputNotFound(_)));
        assert!(!out.exists());
    }

    #[test]
    fn test_unparseable_pdf_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("broken.pdf");
        let out = dir.path().join("raw.txt");
        std::fs::write(&pdf, b"this is not a pdf").unwrap();

        let err = extract_to_file(&pdf, &out, |_, _| {}).unwrap_err();
        assert!(matches!(err, CasebookError::Parse(_)));
        assert!(!out.exists());
    }
}

//! PDF text extraction.
//!
//! Uploads arrive as raw bytes and leave here as one plain-text string, pages
//! concatenated in page order. No whitespace normalization is applied; the chunker
//! downstream owns segmentation.

use lopdf::Document;
use thiserror::Error;

/// Errors raised while turning an uploaded file into plain text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The payload could not be parsed as a PDF document.
    #[error("failed to parse PDF: {0}")]
    Parse(String),
}

/// Interface implemented by document text extractors.
pub trait TextExtractor: Send + Sync {
    /// Produce the document's full text, pages concatenated in order.
    ///
    /// A well-formed document with no text content yields an empty string.
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// `lopdf`-backed extractor for PDF uploads.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let document =
            Document::load_mem(bytes).map_err(|error| ExtractError::Parse(error.to_string()))?;
        let mut text = String::new();
        for (page_number, _object_id) in document.get_pages() {
            let page_text = document
                .extract_text(&[page_number])
                .map_err(|error| ExtractError::Parse(error.to_string()))?;
            text.push_str(&page_text);
        }
        Ok(text)
    }
}

/// Serialize a minimal PDF with one text page per entry, for tests that need real
/// parseable input.
#[cfg(test)]
pub(crate) fn encode_test_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
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
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let kid_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => kid_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize PDF");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_pages_in_order() {
        let bytes = encode_test_pdf(&["alpha bravo charlie", "delta echo foxtrot"]);

        let text = PdfTextExtractor.extract(&bytes).expect("extract text");

        let first = text.find("alpha bravo charlie").expect("page one text");
        let second = text.find("delta echo foxtrot").expect("page two text");
        assert!(first < second, "page text out of order: {text:?}");
    }

    #[test]
    fn document_without_pages_yields_empty_text() {
        let bytes = encode_test_pdf(&[]);

        let text = PdfTextExtractor.extract(&bytes).expect("extract text");

        assert!(text.trim().is_empty(), "expected no text, got {text:?}");
    }

    #[test]
    fn rejects_bytes_that_are_not_a_pdf() {
        let error = PdfTextExtractor
            .extract(b"definitely not a portable document")
            .expect_err("garbage input must fail");

        assert!(matches!(error, ExtractError::Parse(_)));
    }
}

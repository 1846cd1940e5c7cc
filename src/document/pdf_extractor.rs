//! PDF text extraction wrapper
//!
//! Wraps the pdf-extract crate. Every failure mode collapses to an empty
//! document:
//! - Encrypted or corrupted PDFs (library error)
//! - Scanned/image-only PDFs (no text on any page)
//! - Malformed content streams that make the parser panic

use super::ExtractedDocument;
use std::panic::{self, AssertUnwindSafe};

/// Extract the text of every page, concatenated in page order.
///
/// Pages without text contribute nothing. Never fails: an unreadable file
/// yields an empty document, which callers must treat as "nothing usable".
pub fn extract_text_from_pdf(pdf_bytes: &[u8]) -> ExtractedDocument {
    if pdf_bytes.is_empty() {
        tracing::warn!("Empty PDF upload");
        return ExtractedDocument::default();
    }

    let text = match read_text(pdf_bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(bytes = pdf_bytes.len(), error = %e, "Error extracting text from PDF");
            return ExtractedDocument::default();
        }
    };

    let document = ExtractedDocument::new(text);
    if document.is_empty() {
        tracing::warn!(bytes = pdf_bytes.len(), "PDF has no text layer");
    } else {
        tracing::info!(chars = document.char_count(), "Extracted PDF text");
    }
    document
}

/// Raw document text, with parser panics converted to errors
fn read_text(pdf_bytes: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed font and content streams
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(pdf_bytes)));

    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(format!("PDF parser panicked: {}", msg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// PDF with one page per entry; `None` is a page without any text
    fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for page in pages {
            let operations = match page {
                Some(text) => vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
                None => vec![],
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_pages_are_concatenated_in_order() {
        let doc = extract_text_from_pdf(&build_pdf(&[Some("Alpha"), Some("Bravo")]));
        let words: Vec<&str> = doc.text().split_whitespace().collect();
        assert_eq!(words, vec!["Alpha", "Bravo"]);
    }

    #[test]
    fn test_blank_page_adds_no_placeholder() {
        let doc = extract_text_from_pdf(&build_pdf(&[Some("Alpha"), None, Some("Charlie")]));
        let words: Vec<&str> = doc.text().split_whitespace().collect();
        assert_eq!(words, vec!["Alpha", "Charlie"]);
    }

    #[test]
    fn test_pdf_without_text_is_empty() {
        let doc = extract_text_from_pdf(&build_pdf(&[None, None]));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_empty_bytes_give_empty_document() {
        assert!(extract_text_from_pdf(&[]).is_empty());
    }

    #[test]
    fn test_garbage_bytes_give_empty_document() {
        let doc = extract_text_from_pdf(b"this is certainly not a pdf file");
        assert!(doc.is_empty());
    }

    #[test]
    fn test_truncated_header_gives_empty_document() {
        let doc = extract_text_from_pdf(b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog");
        assert!(doc.is_empty());
    }
}

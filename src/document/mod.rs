//! Uploaded document handling
//!
//! One PDF in, one `ExtractedDocument` out. The text is read-only for the rest
//! of the run and dropped with it.

pub mod pdf_extractor;

pub use pdf_extractor::extract_text_from_pdf;

/// Plain text of an uploaded document (possibly empty)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    text: String,
}

impl ExtractedDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Nothing usable: empty or whitespace only
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

impl From<String> for ExtractedDocument {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

//! Turns uploaded bytes into plain text.
//!
//! PDFs are parsed with lopdf, one page at a time; pages are joined with a blank
//! line so every page starts a new paragraph. Anything else must be UTF-8 text
//! (plain text or markdown).

use lopdf::Document;

const PDF_MAGIC: &[u8] = b"%PDF-";
const PAGE_SEPARATOR: &str = "\n\n";

/// Kind of document detected from its leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
}

impl DocumentFormat {
    pub fn detect(bytes: &[u8]) -> Self {
        let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(0);
        if bytes[start..].starts_with(PDF_MAGIC) {
            DocumentFormat::Pdf
        } else {
            DocumentFormat::Text
        }
    }
}

/// Extracts the text of a document, pages separated by a blank line.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    match DocumentFormat::detect(bytes) {
        DocumentFormat::Pdf => extract_pdf_text(bytes),
        DocumentFormat::Text => {
            let text = std::str::from_utf8(bytes).map_err(|_| ExtractError::Unsupported)?;
            if text.contains('\0') {
                return Err(ExtractError::Unsupported);
            }
            Ok(normalize_newlines(text).trim().to_string())
        }
    }
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = Document::load_mem(bytes)?;
    if doc.is_encrypted() {
        return Err(ExtractError::Encrypted);
    }
    let mut pages = Vec::new();
    for page_number in doc.get_pages().into_keys() {
        let text = doc
            .extract_text(&[page_number])
            .map_err(|source| ExtractError::Page {
                page: page_number,
                source,
            })?;
        let text = normalize_newlines(&text);
        let text = text.trim();
        if !text.is_empty() {
            pages.push(text.to_string());
        }
    }
    tracing::debug!(pages = pages.len(), "extracted pdf text");
    Ok(pages.join(PAGE_SEPARATOR))
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("not a readable PDF: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("PDF is encrypted")]
    Encrypted,
    #[error("failed to read text of page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: lopdf::Error,
    },
    #[error("unsupported document format (expected PDF or UTF-8 text)")]
    Unsupported,
}

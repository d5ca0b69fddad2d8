use crate::artifact::ArtifactKind;
use crate::error::ProcessError;
use crate::processor::DocumentProcessor;

/// Placeholder lopdf emits for CID fonts it cannot decode.
const IDENTITY_H_PATTERN: &str = "?Identity-H Unimplemented?";

pub struct PdfProcessor;

impl PdfProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for PdfProcessor {
    fn process(&self, bytes: &[u8]) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.pdf").entered();

        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| ProcessError::PdfProcessing(format!("Failed to load PDF: {}", e)))?;

        Ok(extract_text_from_pdf(&doc))
    }

    fn supports(&self, kind: ArtifactKind) -> bool {
        matches!(kind, ArtifactKind::Pdf)
    }
}

/// Extracts text page by page. Pages that fail to decode are skipped.
fn extract_text_from_pdf(doc: &lopdf::Document) -> String {
    let mut pages = Vec::new();

    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                let normalized = normalize_page(&page_text);
                if !normalized.is_empty() {
                    pages.push(normalized);
                }
            }
            Err(e) => log::debug!("Skipping PDF page {}: {}", page_num, e),
        }
    }

    pages.join("\n\n")
}

/// Drops undecodable-font markers and form feeds, unifies line endings and
/// trims trailing whitespace so page joins do not stack blank lines.
fn normalize_page(text: &str) -> String {
    text.replace(IDENTITY_H_PATTERN, "")
        .replace("\r\n", "\n")
        .replace(['\r', '\u{c}'], "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

use crate::artifact::ArtifactKind;
use crate::error::ProcessError;
use crate::processor::DocumentProcessor;

const UTF8_BOM: &str = "\u{feff}";

pub struct TextProcessor;

impl TextProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for TextProcessor {
    fn process(&self, bytes: &[u8]) -> Result<String, ProcessError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ProcessError::InvalidEncoding(e.to_string()))?;
        Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text).to_string())
    }

    fn supports(&self, kind: ArtifactKind) -> bool {
        matches!(kind, ArtifactKind::Text)
    }
}

use std::io::{Cursor, Read, Seek};

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};
use quick_xml::Reader;

use crate::artifact::ArtifactKind;
use crate::error::ProcessError;
use crate::processor::DocumentProcessor;

pub struct DocxProcessor;

impl DocxProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for DocxProcessor {
    fn process(&self, bytes: &[u8]) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.docx").entered();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ProcessError::DocxProcessing(format!("Failed to open DOCX: {}", e)))?;

        extract_docx_text(&mut archive)
    }

    fn supports(&self, kind: ArtifactKind) -> bool {
        matches!(kind, ArtifactKind::Word)
    }
}

fn extract_docx_text<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<String, ProcessError> {
    let mut document_xml = archive
        .by_name("word/document.xml")
        .map_err(|e| ProcessError::DocxProcessing(format!("Failed to find document.xml: {}", e)))?;

    let mut xml_content = String::new();
    document_xml
        .read_to_string(&mut xml_content)
        .map_err(|e| ProcessError::DocxProcessing(format!("Failed to read document.xml: {}", e)))?;

    parse_docx_xml(&xml_content)
}

/// Collects `w:t` runs per `w:p` paragraph. Paragraphs are separated by a
/// newline; empty paragraphs are dropped.
pub(crate) fn parse_docx_xml(xml: &str) -> Result<String, ProcessError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text_element = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_element = true,
                b"p" => current.clear(),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" => current.push('\n'),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_element = false,
                b"p" => {
                    let paragraph = current.trim();
                    if !paragraph.is_empty() {
                        paragraphs.push(paragraph.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text_element {
                    let decoded = e.decode().unwrap_or_default();
                    current.push_str(&decoded);
                }
            }
            Ok(Event::GeneralRef(ref e)) => {
                if in_text_element {
                    push_entity(&mut current, e);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProcessError::DocxProcessing(format!(
                    "XML parsing error: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

/// Character references and the five predefined XML entities. Anything else
/// is dropped.
fn push_entity(out: &mut String, entity: &BytesRef<'_>) {
    if let Ok(Some(ch)) = entity.resolve_char_ref() {
        out.push(ch);
        return;
    }
    if let Ok(name) = entity.decode() {
        if let Some(text) = resolve_predefined_entity(&name) {
            out.push_str(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
            <w:body>
                <w:p><w:r><w:t>Weekly sync</w:t></w:r></w:p>
                <w:p></w:p>
                <w:p><w:r><w:t xml:space="preserve">Decisions: </w:t></w:r><w:r><w:t>ship and review</w:t></w:r></w:p>
            </w:body>
        </w:document>"#;

    fn build_docx(xml: &str) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            writer
                .start_file("word/document.xml", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_supports_word_kind() {
        let processor = DocxProcessor::new();
        assert!(processor.supports(ArtifactKind::Word));
        assert!(!processor.supports(ArtifactKind::Pdf));
        assert!(!processor.supports(ArtifactKind::Text));
    }

    #[test]
    fn test_parse_paragraphs_newline_separated() {
        let text = parse_docx_xml(DOCUMENT_XML).unwrap();
        assert_eq!(text, "Weekly sync\nDecisions: ship and review");
    }

    #[test]
    fn test_entities_are_resolved() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
            <w:body><w:p><w:r><w:t>R&amp;D budget &#8364;40k &lt;draft&gt;</w:t></w:r></w:p></w:body>
        </w:document>"#;
        let text = parse_docx_xml(xml).unwrap();
        assert_eq!(text, "R&D budget \u{20ac}40k <draft>");
    }

    #[test]
    fn test_process_docx_archive() {
        let bytes = build_docx(DOCUMENT_XML);
        let text = DocxProcessor::new().process(&bytes).unwrap();
        assert!(text.starts_with("Weekly sync"));
    }

    #[test]
    fn test_not_a_zip() {
        let result = DocxProcessor::new().process(b"plain bytes");
        assert!(matches!(result, Err(ProcessError::DocxProcessing(_))));
    }

    #[test]
    fn test_zip_without_document_xml() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            writer
                .start_file("other.xml", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"<x/>").unwrap();
            writer.finish().unwrap();
        }
        let result = DocxProcessor::new().process(&buffer.into_inner());
        match result {
            Err(ProcessError::DocxProcessing(msg)) => assert!(msg.contains("document.xml")),
            _ => panic!("Expected DocxProcessing error"),
        }
    }
}

//! Builders for test artifacts and pipeline wiring.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use lopdf::{dictionary, Document, Object, Stream};

use meetscribe::generation::{RetryPolicy, TextGenerationProvider};
use meetscribe::{
    ContentExtractor, Generator, GeneratorSettings, JobPipeline, LargeFileProcessor,
    LargeFileSettings, Transcriber, TranscriberSettings,
};

use super::stubs::NoMedia;

/// A meeting transcript with enough words to pass content validation.
pub const MEETING: &str = "Lucia opened the quarterly planning meeting with the data platform team. \
    They agreed to move the ingestion jobs to the new cluster before the end of March, \
    and Tomas will prepare the rollback plan for review next Tuesday.";

/// `count` paragraphs of roughly 60 characters each, numbered from 1.
pub fn numbered_paragraphs(count: usize) -> String {
    (1..=count)
        .map(|n| format!("Paragraph {} covers the agreed actions for workstream {}.", n, n))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Minimal PDF with one Helvetica text line per page.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let kids: Vec<Object> = pages
        .iter()
        .map(|text| {
            let content = format!("BT\n/F1 12 Tf\n72 720 Td\n({}) Tj\nET\n", text);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            })
            .into()
        })
        .collect();

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
    doc.save_to(&mut bytes).expect("Failed to serialize PDF");
    bytes
}

/// Builder for a [`JobPipeline`] over a stub provider and no media tools.
pub struct PipelineBuilder {
    provider: Arc<dyn TextGenerationProvider>,
    retry: RetryPolicy,
    large_threshold: u64,
    max_chunk_chars: usize,
    max_file_bytes: u64,
}

impl PipelineBuilder {
    pub fn new(provider: Arc<dyn TextGenerationProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::new(1, Duration::from_millis(1), Duration::from_secs(5)),
            large_threshold: 10 * 1024 * 1024,
            max_chunk_chars: 15_000,
            max_file_bytes: LargeFileSettings::default().max_file_bytes,
        }
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Artifacts strictly larger than `bytes` take the chunked path.
    pub fn large_threshold(mut self, bytes: u64) -> Self {
        self.large_threshold = bytes;
        self
    }

    pub fn max_chunk_chars(mut self, chars: usize) -> Self {
        self.max_chunk_chars = chars;
        self
    }

    /// Hard cap above which large files fail without processing.
    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    pub fn generator(&self) -> Arc<Generator> {
        let settings = GeneratorSettings {
            retry: self.retry,
            ..GeneratorSettings::default()
        };
        Arc::new(Generator::new(self.provider.clone(), settings))
    }

    pub fn build(self) -> JobPipeline {
        let generator = self.generator();
        let transcriber = Arc::new(Transcriber::new(
            Vec::new(),
            TranscriberSettings {
                metadata_fallback: false,
                ..TranscriberSettings::default()
            },
        ));
        let extractor = Arc::new(ContentExtractor::new(transcriber.clone()));
        let large_files = Arc::new(LargeFileProcessor::new(
            extractor.clone(),
            transcriber,
            generator.clone(),
            Arc::new(NoMedia),
            LargeFileSettings {
                max_chunk_chars: self.max_chunk_chars,
                max_file_bytes: self.max_file_bytes,
                ..LargeFileSettings::default()
            },
        ));
        JobPipeline::new(extractor, generator, large_files, self.large_threshold)
    }
}

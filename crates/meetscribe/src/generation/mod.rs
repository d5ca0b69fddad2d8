//! Document generation against an external text-generation provider.
//!
//! The [`Generator`] validates input, truncates it to a hard cap, builds the
//! instruction document for the requested job kind and calls the provider
//! under a bounded exponential-backoff retry policy. Callers that must always
//! get text back use [`Generator::generate_or_fallback`], which recovers any
//! provider failure into a locally built, clearly marked degraded document.

mod error;
pub mod fallback;
pub mod gemini;
mod language;
pub mod prompts;
mod provider;
mod retry;
pub mod validation;

pub use error::{ErrorClass, GenerationError};
pub use fallback::{is_degraded, DEGRADED_MARKER};
pub use gemini::GeminiProvider;
pub use language::{detect_language, Language};
pub use provider::{
    GenerationParams, ProviderError, ProviderErrorKind, TextGenerationProvider,
    UnconfiguredProvider,
};
pub use retry::RetryPolicy;
pub use validation::{Rejection, ValidationFailure};

use std::borrow::Cow;
use std::sync::Arc;

use log::{debug, info, warn};
use tracing::Instrument;

use crate::chunking::{self, Chunk, Combined};
use crate::config::GenerationConfig;
use crate::guidance;
use crate::worker::job::JobKind;

/// A fully specified generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub content: String,
    pub kind: JobKind,
    pub language: Language,
    pub business_context: Option<String>,
}

impl GenerationRequest {
    pub fn new(content: impl Into<String>, kind: JobKind, language: Language) -> Self {
        Self {
            content: content.into(),
            kind,
            language,
            business_context: None,
        }
    }

    pub fn with_business_context(mut self, context: impl Into<String>) -> Self {
        self.business_context = Some(context.into());
        self
    }
}

/// Tunables injected at construction.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub retry: RetryPolicy,
    pub params: GenerationParams,
    pub content_cap_chars: usize,
    pub large_content_cap_chars: usize,
    pub min_content_chars: usize,
}

impl GeneratorSettings {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            retry: RetryPolicy::from_config(config),
            params: GenerationParams {
                temperature: config.temperature,
                top_k: config.top_k,
                top_p: config.top_p,
                max_output_tokens: config.max_output_tokens,
            },
            content_cap_chars: config.content_cap_chars,
            large_content_cap_chars: config.large_content_cap_chars,
            min_content_chars: config.min_content_chars,
        }
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

/// Truncates `content` to `cap` characters, appending a marker that states how
/// much was kept. Content within the cap is returned borrowed.
pub fn truncate_content(content: &str, cap: usize, language: Language) -> Cow<'_, str> {
    let total = content.chars().count();
    if total <= cap {
        return Cow::Borrowed(content);
    }

    let kept: String = content.chars().take(cap).collect();
    let marker = match language {
        Language::Es => format!(
            "\n\n[CONTENIDO TRUNCADO: se procesaron los primeros {} de {} caracteres]",
            cap, total
        ),
        Language::En => format!(
            "\n\n[CONTENT TRUNCATED: the first {} of {} characters were processed]",
            cap, total
        ),
    };
    Cow::Owned(kept + &marker)
}

pub struct Generator {
    provider: Arc<dyn TextGenerationProvider>,
    settings: GeneratorSettings,
}

impl Generator {
    pub fn new(provider: Arc<dyn TextGenerationProvider>, settings: GeneratorSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generates the document for `request` with the standard content cap.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.generate_capped(request, self.settings.content_cap_chars)
            .await
    }

    /// Same as [`generate`](Self::generate) with the larger cap used for
    /// content that came through the large-file path.
    pub async fn generate_large(
        &self,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError> {
        self.generate_capped(request, self.settings.large_content_cap_chars)
            .await
    }

    async fn generate_capped(
        &self,
        request: &GenerationRequest,
        cap: usize,
    ) -> Result<String, GenerationError> {
        let span = tracing::info_span!(
            "generate",
            kind = request.kind.as_str(),
            language = request.language.code(),
            provider = self.provider.name(),
        );

        async {
            validation::validate_content(
                &request.content,
                request.kind,
                request.language,
                self.settings.min_content_chars,
            )
            .map_err(|rejection| {
                info!(
                    "Generation rejected before provider call: {:?}",
                    rejection.reason
                );
                GenerationError::Rejected(rejection)
            })?;

            let content = truncate_content(&request.content, cap, request.language);
            if matches!(content, Cow::Owned(_)) {
                warn!(
                    "Content truncated to {} characters before generation",
                    cap
                );
            }

            let prompt = prompts::build_prompt(
                request.kind,
                request.language,
                &content,
                request.business_context.as_deref(),
            );
            self.call_with_retry(&prompt, request.language).await
        }
        .instrument(span)
        .await
    }

    /// Never fails: validation rejections yield their guidance and provider
    /// failures yield the degraded fallback document.
    pub async fn generate_or_fallback(&self, request: &GenerationRequest) -> String {
        self.recover(request, self.generate(request).await)
    }

    pub async fn generate_large_or_fallback(&self, request: &GenerationRequest) -> String {
        self.recover(request, self.generate_large(request).await)
    }

    fn recover(&self, request: &GenerationRequest, outcome: Result<String, GenerationError>) -> String {
        match outcome {
            Ok(text) => text,
            Err(GenerationError::Rejected(rejection)) => rejection.guidance,
            Err(e) => {
                warn!(
                    "Generation failed ({}), using basic mode: {}",
                    e.class().as_str(),
                    e
                );
                fallback::fallback_response(&request.content, request.kind, request.language)
            }
        }
    }

    /// Translates `content` into `target`. The source language is detected
    /// when not given. Equal languages return the input without a provider call.
    pub async fn translate(
        &self,
        content: &str,
        source: Option<Language>,
        target: Language,
    ) -> Result<String, GenerationError> {
        let source = source.unwrap_or_else(|| detect_language(content));
        if source == target {
            debug!("Translation skipped, content already in {}", target);
            return Ok(content.to_string());
        }

        let span = tracing::info_span!("translate", from = source.code(), to = target.code());
        let prompt = prompts::translation_prompt(content, source, target);
        self.call_with_retry(&prompt, target).instrument(span).await
    }

    /// Summarises one chunk of a long document.
    pub async fn summarize_chunk(
        &self,
        chunk: &Chunk,
        language: Language,
    ) -> Result<String, GenerationError> {
        let prompt = prompts::chunk_summary_prompt(chunk.index, chunk.total, &chunk.text, language);
        self.call_with_retry(&prompt, language).await
    }

    /// Merges per-chunk partial results in order. Multiple partials are
    /// re-summarised, falling back to their plain join if that fails.
    pub async fn combine_partials(&self, partials: Vec<String>, language: Language) -> String {
        match chunking::combine(partials) {
            Combined::Empty => guidance::no_fragments_processed(language),
            Combined::Single(text) => text,
            Combined::Joined(joined) => {
                let prompt = prompts::combine_prompt(&joined, language);
                match self.call_with_retry(&prompt, language).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Re-summarising partials failed, using joined text: {}", e);
                        joined
                    }
                }
            }
        }
    }

    /// Calls the provider until it succeeds, fails with a non-retryable
    /// error, or `max_attempts` is exhausted. Backoff `base * 2^n` is slept
    /// after every retryable failure, the last one included.
    async fn call_with_retry(
        &self,
        prompt: &str,
        language: Language,
    ) -> Result<String, GenerationError> {
        let policy = self.settings.retry;
        let mut last_kind = ProviderErrorKind::Overloaded;

        for attempt in 0..policy.max_attempts {
            let call = self.provider.generate(prompt, &self.settings.params);
            let error = match tokio::time::timeout(policy.call_timeout, call).await {
                Ok(Ok(text)) => {
                    debug!(
                        "Provider {} answered on attempt {}",
                        self.provider.name(),
                        attempt + 1
                    );
                    return Ok(text);
                }
                Ok(Err(e)) => e,
                Err(_) => ProviderError::new(
                    ProviderErrorKind::Timeout,
                    format!("call exceeded {:?}", policy.call_timeout),
                ),
            };

            if !error.kind.is_retryable() {
                warn!("Provider error is not retryable: {}", error);
                return Err(GenerationError::Provider(error));
            }

            let delay = policy.delay_for(attempt);
            warn!(
                "Attempt {}/{} failed ({}), backing off {:?}",
                attempt + 1,
                policy.max_attempts,
                error.kind,
                delay
            );
            last_kind = error.kind;
            tokio::time::sleep(delay).await;
        }

        Err(match last_kind {
            ProviderErrorKind::Timeout => GenerationError::Timeout {
                attempts: policy.max_attempts,
            },
            _ => GenerationError::Overloaded {
                attempts: policy.max_attempts,
                guidance: ErrorClass::Overloaded.message("", language),
            },
        })
    }
}

use thiserror::Error;

use super::language::Language;
use super::provider::{ProviderError, ProviderErrorKind};
use super::validation::Rejection;

#[derive(Error, Debug)]
pub enum GenerationError {
    /// Every attempt reported overload. Carries user-facing remediation text.
    #[error("{guidance}")]
    Overloaded { attempts: u32, guidance: String },

    /// Every attempt exceeded the call deadline.
    #[error("generation timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// A non-retryable provider failure.
    #[error("{0}")]
    Provider(ProviderError),

    /// Input rejected before the provider was called.
    #[error("{}", .0.guidance)]
    Rejected(Rejection),
}

impl GenerationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            GenerationError::Overloaded { .. } => ErrorClass::Overloaded,
            GenerationError::Timeout { .. } => ErrorClass::Timeout,
            GenerationError::Provider(e) => match e.kind {
                ProviderErrorKind::Overloaded => ErrorClass::Overloaded,
                ProviderErrorKind::Timeout => ErrorClass::Timeout,
                _ => ErrorClass::ProviderError,
            },
            GenerationError::Rejected(_) => ErrorClass::Unknown,
        }
    }
}

/// User-facing error taxonomy for failed jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Overloaded,
    Timeout,
    /// Video or audio that could not be transcribed.
    UnsupportedMedia,
    /// A document without extractable text, such as a scanned PDF.
    UnsupportedFormat,
    ProviderError,
    Unknown,
}

impl ErrorClass {
    /// Substring classifier for error text that carries no structured kind.
    pub fn classify_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("overloaded") || lower.contains("rate limit") || lower.contains("quota")
        {
            ErrorClass::Overloaded
        } else if lower.contains("timeout") || lower.contains("timed out") {
            ErrorClass::Timeout
        } else if lower.contains("video") || lower.contains("audio") {
            ErrorClass::UnsupportedMedia
        } else if lower.contains("pdf") {
            ErrorClass::UnsupportedFormat
        } else if lower.contains("api") || lower.contains("provider") {
            ErrorClass::ProviderError
        } else {
            ErrorClass::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Overloaded => "overloaded",
            ErrorClass::Timeout => "timeout",
            ErrorClass::UnsupportedMedia => "unsupported-media",
            ErrorClass::UnsupportedFormat => "unsupported-format",
            ErrorClass::ProviderError => "provider-error",
            ErrorClass::Unknown => "unknown",
        }
    }

    /// Remediation message shown as the result of a failed job.
    pub fn message(&self, detail: &str, language: Language) -> String {
        match (self, language) {
            (ErrorClass::Overloaded, Language::Es) => "Error: La API de generación está temporalmente sobrecargada. El sistema reintentó automáticamente sin éxito. Intenta nuevamente en unos minutos.".to_string(),
            (ErrorClass::Overloaded, Language::En) => "Error: The generation API is temporarily overloaded. Automatic retries did not succeed. Please try again in a few minutes.".to_string(),
            (ErrorClass::Timeout, Language::Es) => "Error: La solicitud tardó demasiado en procesarse. Esto puede deberse a contenido muy largo o problemas de conectividad. Intenta con contenido más corto.".to_string(),
            (ErrorClass::Timeout, Language::En) => "Error: The request took too long to process. This can be caused by very long content or connectivity problems. Try with shorter content.".to_string(),
            (ErrorClass::UnsupportedMedia, Language::Es) => "Error: Los archivos de video y audio requieren transcripción previa. Por favor, proporciona una transcripción en formato texto (.txt) del contenido.".to_string(),
            (ErrorClass::UnsupportedMedia, Language::En) => "Error: Video and audio files require a transcription first. Please provide a plain text (.txt) transcription of the content.".to_string(),
            (ErrorClass::UnsupportedFormat, Language::Es) => "Error: El archivo PDF no contiene texto extraíble. Por favor, convierte el PDF a texto o proporciona una transcripción.".to_string(),
            (ErrorClass::UnsupportedFormat, Language::En) => "Error: The PDF file contains no extractable text. Please convert the PDF to text or provide a transcription.".to_string(),
            (ErrorClass::ProviderError, Language::Es) => format!("Error de la API: {}. Por favor, verifica que el contenido sea válido e intenta nuevamente.", detail),
            (ErrorClass::ProviderError, Language::En) => format!("API error: {}. Please verify the content is valid and try again.", detail),
            (ErrorClass::Unknown, Language::Es) => format!("Error inesperado: {}. Por favor, intenta nuevamente o contacta al administrador si el problema persiste.", detail),
            (ErrorClass::Unknown, Language::En) => format!("Unexpected error: {}. Please try again or contact the administrator if the problem persists.", detail),
        }
    }
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeetscribeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Transcription error: {0}")]
    Transcription(#[from] crate::transcription::TranscriptionError),

    #[error("Generation error: {0}")]
    Generation(#[from] crate::generation::GenerationError),

    #[error("Media error: {0}")]
    Media(#[from] crate::media::MediaError),

    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Unsupported media type: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read artifact '{path}': {source}")]
    ReadArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Failed to process DOCX: {0}")]
    DocxProcessing(String),

    #[error("Text is not valid UTF-8: {0}")]
    InvalidEncoding(String),

    #[error("Text extraction failed: {0}")]
    TextExtraction(String),
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Meeting {0} not found")]
    MeetingNotFound(i64),

    #[error("No {kind} job found for meeting {meeting_id}")]
    JobNotFound { meeting_id: i64, kind: String },

    #[error("Job {kind} for meeting {meeting_id} has no result to translate")]
    NothingToTranslate { meeting_id: i64, kind: String },

    #[error("A {kind} job for meeting {meeting_id} is already being processed")]
    AlreadyInFlight { meeting_id: i64, kind: String },

    #[error("Meeting {meeting_id} has no attached artifact")]
    MissingArtifact { meeting_id: i64 },

    #[error("Synchronous mode only accepts artifacts up to {limit} bytes (got {size})")]
    TooLargeForSync { size: u64, limit: u64 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, MeetscribeError>;

pub mod artifact;
pub mod chunking;
pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod guidance;
pub mod http;
pub mod large_file;
pub mod media;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod secrets;
pub mod telemetry;
pub mod transcription;
pub mod worker;

pub use artifact::{Artifact, ArtifactKind, MediaMetadata};
pub use config::{load_config, load_config_from_str, Config};
pub use db::Database;
pub use error::{ConfigError, MeetscribeError, OrchestratorError, ProcessError, Result};
pub use generation::{GenerationError, GenerationRequest, Generator, GeneratorSettings, Language};
pub use large_file::{LargeFileOutcome, LargeFileProcessor, LargeFileSettings};
pub use pipeline::{JobPipeline, JobProgressBroadcaster, Strategy};
pub use processor::{ContentExtractor, ExtractionResult};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
pub use telemetry::init_logging;
pub use transcription::{Transcriber, TranscriberSettings};
pub use worker::{JobKind, JobOrchestrator, JobResult, JobStatus, MeetingStatus, ProcessingRequest};

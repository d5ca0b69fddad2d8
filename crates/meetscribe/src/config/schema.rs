use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::generation::Language;
use crate::secrets::{self, SecretError};
use crate::transcription::SpeechCredentials;

const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            generation: GenerationConfig::default(),
            chunking: ChunkingConfig::default(),
            limits: LimitsConfig::default(),
            transcription: TranscriptionConfig::default(),
            credentials: CredentialsConfig::default(),
            logging: LoggingConfig::default(),
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    crate::db::default_database_path()
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|| "meetscribe.db".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_content_cap")]
    pub content_cap_chars: usize,
    #[serde(default = "default_large_content_cap")]
    pub large_content_cap_chars: usize,
    #[serde(default = "default_min_chars")]
    pub min_content_chars: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_generation_base_url() -> String {
    crate::generation::gemini::DEFAULT_BASE_URL.to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    45
}

fn default_content_cap() -> usize {
    200_000
}

fn default_large_content_cap() -> usize {
    500_000
}

fn default_min_chars() -> usize {
    50
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    8192
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_generation_base_url(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            timeout_secs: default_timeout_secs(),
            content_cap_chars: default_content_cap(),
            large_content_cap_chars: default_large_content_cap(),
            min_content_chars: default_min_chars(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

fn default_max_chunk_chars() -> usize {
    100_000
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

/// Size and length thresholds for strategy selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Largest input accepted by synchronous processing.
    #[serde(default = "default_sync_max_bytes")]
    pub sync_max_bytes: u64,
    #[serde(default = "default_large_file_threshold")]
    pub large_file_threshold_bytes: u64,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_video_segment_secs")]
    pub video_segment_secs: u64,
    #[serde(default = "default_min_chars")]
    pub min_transcript_chars: usize,
    #[serde(default = "default_min_segment_chars")]
    pub min_segment_chars: usize,
    #[serde(default = "default_min_extracted_audio_bytes")]
    pub min_extracted_audio_bytes: u64,
}

fn default_sync_max_bytes() -> u64 {
    5 * MB
}

fn default_large_file_threshold() -> u64 {
    10 * MB
}

fn default_max_file_bytes() -> u64 {
    100 * MB
}

fn default_video_segment_secs() -> u64 {
    600
}

fn default_min_segment_chars() -> usize {
    10
}

fn default_min_extracted_audio_bytes() -> u64 {
    1000
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            sync_max_bytes: default_sync_max_bytes(),
            large_file_threshold_bytes: default_large_file_threshold(),
            max_file_bytes: default_max_file_bytes(),
            video_segment_secs: default_video_segment_secs(),
            min_transcript_chars: default_min_chars(),
            min_segment_chars: default_min_segment_chars(),
            min_extracted_audio_bytes: default_min_extracted_audio_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(default = "default_true")]
    pub metadata_fallback: bool,
    #[serde(default)]
    pub language_hint: Option<Language>,
}

fn default_true() -> bool {
    true
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            metadata_fallback: true,
            language_hint: None,
        }
    }
}

/// Where to find one provider key. See [`crate::secrets::resolve_secret`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretSource {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub env_var: Option<String>,
}

impl SecretSource {
    pub fn from_env(name: &str) -> Self {
        Self {
            env_var: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn resolve(&self) -> Result<Option<SecretString>, SecretError> {
        secrets::resolve_secret_optional(
            self.value.as_deref(),
            self.file.as_deref(),
            self.env_var.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default = "default_gemini_source")]
    pub gemini: SecretSource,
    #[serde(default = "default_openai_source")]
    pub openai: SecretSource,
    #[serde(default = "default_assemblyai_source")]
    pub assemblyai: SecretSource,
    #[serde(default)]
    pub openai_base_url: Option<String>,
    #[serde(default)]
    pub assemblyai_base_url: Option<String>,
}

impl CredentialsConfig {
    pub fn speech_credentials(&self) -> Result<SpeechCredentials, SecretError> {
        Ok(SpeechCredentials {
            openai_api_key: self.openai.resolve()?,
            openai_base_url: self.openai_base_url.clone(),
            assemblyai_api_key: self.assemblyai.resolve()?,
            assemblyai_base_url: self.assemblyai_base_url.clone(),
        })
    }
}

fn default_gemini_source() -> SecretSource {
    SecretSource::from_env("GEMINI_API_KEY")
}

fn default_openai_source() -> SecretSource {
    SecretSource::from_env("OPENAI_API_KEY")
}

fn default_assemblyai_source() -> SecretSource {
    SecretSource::from_env("ASSEMBLY_AI_KEY")
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            gemini: default_gemini_source(),
            openai: default_openai_source(),
            assemblyai: default_assemblyai_source(),
            openai_base_url: None,
            assemblyai_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"version": "1.0"}"#).unwrap();
        assert_eq!(config.generation.model, "gemini-1.5-flash");
        assert_eq!(config.generation.max_attempts, 5);
        assert_eq!(config.chunking.max_chunk_chars, 100_000);
        assert_eq!(config.limits.sync_max_bytes, 5 * MB);
        assert_eq!(config.limits.large_file_threshold_bytes, 10 * MB);
        assert_eq!(config.limits.max_file_bytes, 100 * MB);
        assert!(config.transcription.metadata_fallback);
        assert_eq!(
            config.credentials.openai.env_var.as_deref(),
            Some("OPENAI_API_KEY")
        );
        assert!(config.database_path.ends_with("meetscribe.db"));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"version": "1.0", "generation": {"max_attempts": 2}, "transcription": {"language_hint": "en"}}"#,
        )
        .unwrap();
        assert_eq!(config.generation.max_attempts, 2);
        assert_eq!(config.generation.base_delay_ms, 1000);
        assert_eq!(config.transcription.language_hint, Some(Language::En));
    }
}

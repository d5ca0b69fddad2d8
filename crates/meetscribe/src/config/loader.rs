use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.generation.max_attempts == 0 {
        return Err(ConfigError::InvalidValue {
            field: "generation.max_attempts",
            value: config.generation.max_attempts.to_string(),
        });
    }

    if config.chunking.max_chunk_chars == 0 {
        return Err(ConfigError::InvalidValue {
            field: "chunking.max_chunk_chars",
            value: "0".to_string(),
        });
    }

    if config.generation.large_content_cap_chars < config.chunking.max_chunk_chars {
        return Err(ConfigError::Validation {
            message: format!(
                "generation.large_content_cap_chars ({}) must be at least chunking.max_chunk_chars ({})",
                config.generation.large_content_cap_chars, config.chunking.max_chunk_chars
            ),
        });
    }

    if config.limits.large_file_threshold_bytes < config.limits.sync_max_bytes {
        return Err(ConfigError::Validation {
            message: format!(
                "limits.large_file_threshold_bytes ({}) must be at least limits.sync_max_bytes ({})",
                config.limits.large_file_threshold_bytes, config.limits.sync_max_bytes
            ),
        });
    }

    Ok(())
}

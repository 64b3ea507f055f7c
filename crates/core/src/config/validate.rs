use super::{types::AuthMethod, types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Auth section exists (enforced by serde)
/// - API keys are configured when `api_key` auth is selected
/// - Server port is not 0
/// - Upload chunk size and request body limit are usable
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.auth.method == AuthMethod::ApiKey && config.auth.api_keys.is_empty() {
        return Err(ConfigError::ValidationError(
            "auth.api_keys must not be empty when method = \"api_key\"".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.storage.chunk_size == 0 {
        return Err(ConfigError::ValidationError(
            "storage.chunk_size cannot be 0".to_string(),
        ));
    }

    if config.submission.image_content_type.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "submission.image_content_type cannot be empty".to_string(),
        ));
    }

    Ok(())
}

use crate::config::types::{ApiConfig, CollectionConfig, Config, OutputConfig, PacingConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_pacing_config(&config.pacing)?;
    validate_output_config(&config.output)?;
    validate_collection_config(&config.collection)?;
    Ok(())
}

/// Validates the search API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "Endpoint '{}' must use http or https",
            config.endpoint
        )));
    }

    validate_header_name(&config.key_header)?;

    if config.query_type.trim().is_empty() {
        return Err(ConfigError::Validation(
            "query_type cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates pacing configuration
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.request_timeout < 1000 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1000ms, got {}ms",
            config.request_timeout
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.max_pages_per_window < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages_per_window must be >= 1, got {}",
            config.max_pages_per_window
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the default collection range
fn validate_collection_config(config: &CollectionConfig) -> Result<(), ConfigError> {
    if let (Some(start), Some(end)) = (config.start_date, config.end_date) {
        if start >= end {
            return Err(ConfigError::Validation(format!(
                "start_date ({}) must be before end_date ({})",
                start, end
            )));
        }
    }

    Ok(())
}

/// Header names are HTTP tokens: visible ASCII without separators
fn validate_header_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "key_header cannot be empty".to_string(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c))
    {
        return Err(ConfigError::Validation(format!(
            "key_header '{}' is not a valid HTTP header name",
            name
        )));
    }

    Ok(())
}

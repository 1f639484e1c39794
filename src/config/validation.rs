use crate::config::types::{Config, EndpointConfig, FilterConfig, HarvesterConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvester_config(&config.harvester)?;
    validate_endpoints(&config.endpoints)?;
    validate_filters(&config.filters)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates pipeline limits
fn validate_harvester_config(config: &HarvesterConfig) -> Result<(), ConfigError> {
    if config.concurrency_limit < 1 || config.concurrency_limit > 500 {
        return Err(ConfigError::Validation(format!(
            "concurrency_limit must be between 1 and 500, got {}",
            config.concurrency_limit
        )));
    }

    if config.pages_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "pages_limit must be >= 1, got {}",
            config.pages_limit
        )));
    }

    if config.request_timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_ms must be >= 1".to_string(),
        ));
    }

    if config.max_phone_index < 1 {
        return Err(ConfigError::Validation(format!(
            "max_phone_index must be >= 1, got {}",
            config.max_phone_index
        )));
    }

    Ok(())
}

/// Validates endpoint URLs
fn validate_endpoints(config: &EndpointConfig) -> Result<(), ConfigError> {
    validate_http_url("search_url", &config.search_url)?;
    validate_http_url("phone_url", &config.phone_url)?;
    Ok(())
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use HTTP or HTTPS, got '{}'",
            key, value
        )));
    }

    Ok(())
}

/// Validates the filter bundle
fn validate_filters(config: &FilterConfig) -> Result<(), ConfigError> {
    let year_to = config.effective_year_to();

    for (key, year) in [("year_from", config.year_from), ("year_to", year_to)] {
        if !(1000..=9999).contains(&year) {
            return Err(ConfigError::Validation(format!(
                "{} must be a four-digit year, got {}",
                key, year
            )));
        }
    }

    if config.year_from > year_to {
        return Err(ConfigError::Validation(format!(
            "year_from ({}) must not exceed year_to ({})",
            config.year_from, year_to
        )));
    }

    validate_range("value", config.value_min, config.value_max)?;
    validate_range("mileage", config.mileage_min, config.mileage_max)?;

    Ok(())
}

/// A zero maximum leaves the range open
fn validate_range(key: &str, min: u64, max: u64) -> Result<(), ConfigError> {
    if max != 0 && min > max {
        return Err(ConfigError::Validation(format!(
            "{}_min ({}) must not exceed {}_max ({})",
            key, min, key, max
        )));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

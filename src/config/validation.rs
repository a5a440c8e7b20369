use crate::config::types::{
    ApiConfig, Config, FollowersConfig, InputConfig, OutputConfig, PostsConfig, SearchConfig,
};
use crate::ConfigError;
use std::ops::RangeInclusive;
use url::Url;

/// Page size bounds accepted by each endpoint
const SEARCH_PAGE_SIZE: RangeInclusive<u32> = 10..=100;
const FOLLOWERS_PAGE_SIZE: RangeInclusive<u32> = 1..=1000;
const POSTS_PAGE_SIZE: RangeInclusive<u32> = 5..=100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_input_config(&config.input)?;
    validate_output_config(&config.output)?;
    validate_api_config(&config.api)?;
    validate_search_config(&config.search)?;
    validate_followers_config(&config.followers)?;
    validate_posts_config(&config.posts)?;
    Ok(())
}

fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.url_col.trim().is_empty() {
        return Err(ConfigError::Validation("url-col cannot be empty".to_string()));
    }

    if matches!(config.file.as_deref(), Some(f) if f.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "input file cannot be an empty path".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if !config.query_template.contains("{url}") {
        return Err(ConfigError::Validation(format!(
            "query-template must contain '{{url}}', got '{}'",
            config.query_template
        )));
    }

    validate_page_size("search", config.max_results, SEARCH_PAGE_SIZE)
}

fn validate_followers_config(config: &FollowersConfig) -> Result<(), ConfigError> {
    validate_page_size("followers", config.max_results, FOLLOWERS_PAGE_SIZE)
}

fn validate_posts_config(config: &PostsConfig) -> Result<(), ConfigError> {
    validate_page_size("posts", config.max_results, POSTS_PAGE_SIZE)
}

fn validate_page_size(
    section: &str,
    value: u32,
    bounds: RangeInclusive<u32>,
) -> Result<(), ConfigError> {
    if !bounds.contains(&value) {
        return Err(ConfigError::Validation(format!(
            "[{}] max-results must be between {} and {}, got {}",
            section,
            bounds.start(),
            bounds.end(),
            value
        )));
    }
    Ok(())
}

//! Configuration module for Spread-Mapper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to the defaults used against
//! the public API.
//!
//! # Example
//!
//! ```no_run
//! use spread_mapper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Followers page size: {}", config.followers.max_results);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, Config, CrawlerConfig, FollowersConfig, InputConfig, OutputConfig, PostsConfig,
    SearchConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;

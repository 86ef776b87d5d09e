//! Configuration module for Stack-Scrape
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use stack_scrape::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("stack-scrape.toml")).unwrap();
//! println!("At most {} requests in flight", config.fetcher.max_concurrent);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetcherConfig, OutputConfig, ServerConfig, SiteConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{config_fingerprint, load_config, load_config_with_hash, parse_config};

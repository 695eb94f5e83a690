//! Common error types for the research client

use thiserror::Error;

/// Common result type for research client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the research crates
#[derive(Error, Debug)]
pub enum Error {
    /// TOML document could not be parsed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

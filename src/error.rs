//! Error types for the dlbar library.

use thiserror::Error;

/// Errors that can occur while setting up the notification machinery.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("config parse failed: {0}")]
    Config(#[from] toml::de::Error),
}

/// A specialized `Result` type for dlbar operations.
pub type Result<T> = std::result::Result<T, Error>;

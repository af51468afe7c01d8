//! Application error types

use thiserror::Error;
use unveil_layout::{ObserverError, UnknownSection};

/// Errors raised while building or driving a report page
#[derive(Error, Debug)]
pub enum UnveilError {
    /// Configuration values out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Content file is malformed or inconsistent
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// Section name in a scenario or event that names no section kind
    #[error(transparent)]
    UnknownSection(#[from] UnknownSection),

    #[error(transparent)]
    Observer(#[from] ObserverError),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for application operations
pub type Result<T> = std::result::Result<T, UnveilError>;

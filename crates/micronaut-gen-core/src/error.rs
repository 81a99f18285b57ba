//! Error handling for the micronaut-gen code generation library.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. Type resolution never fails and
//! has no variant here; everything else (loading the document, reading
//! templates, writing the project) reports through this enum.
//!
//! # Examples
//!
//! ```
//! use micronaut_gen_core::error::{Error, Result};
//!
//! fn needs_paths(has_paths: bool) -> Result<()> {
//!     if !has_paths {
//!         return Err(Error::openapi("Missing 'paths' object"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(needs_paths(true).is_ok());
//! ```

use thiserror::Error;

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for generation operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML manifest parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Fetching a remote document failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// OpenAPI error
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    /// Template error
    #[error("Template error: {0}")]
    Template(String),

    /// Template engine error
    #[error("Template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new OpenAPI error
    pub fn openapi<S: Into<String>>(msg: S) -> Self {
        Self::OpenApi(msg.into())
    }

    /// Create a new template error
    pub fn template<S: Into<String>>(msg: S) -> Self {
        Self::Template(msg.into())
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Config(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Config(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_constructors() {
        assert_eq!(
            Error::openapi("no paths").to_string(),
            "OpenAPI error: no paths"
        );
        assert_eq!(
            Error::template("missing").to_string(),
            "Template error: missing"
        );
        assert!(matches!(Error::from("bad"), Error::Config(msg) if msg == "bad"));
    }
}

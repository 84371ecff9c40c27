//! Error handling for the httpgen code generator.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. It uses `thiserror` for easy
//! error handling and implements conversions from common error types.
//!
//! Errors returned by the generator are generator-author facing: they signal
//! a design graph that the design checker should have rejected, a broken
//! template override or an unreadable input file. None of them is meant to be
//! recovered from halfway through an artifact.
//!
//! # Examples
//!
//! ```
//! use httpgen::core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::design("action \"show\" declares no response"))
//! }
//!
//! assert!(might_fail().is_err());
//! ```

use thiserror::Error;

/// Result type for httpgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for httpgen operations
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

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Template engine error
    #[error("Template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A `DataType::User` edge names a type missing from the design
    #[error("Unknown user type: {0}")]
    UnknownUserType(String),

    /// A type kind used where the transport cannot carry it
    #[error("Unsupported type {kind} for {context}")]
    UnsupportedType { context: String, kind: String },

    /// HTTP status code without a known symbolic constant
    #[error("Unknown HTTP status code: {0}")]
    UnknownStatusCode(u16),

    /// The design graph violates an invariant the generator relies on
    #[error("Invalid design: {0}")]
    InvalidDesign(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new invalid design error
    pub fn design<S: Into<String>>(msg: S) -> Self {
        Self::InvalidDesign(msg.into())
    }

    /// Create a new unsupported type error
    pub fn unsupported<C: Into<String>, K: Into<String>>(context: C, kind: K) -> Self {
        Self::UnsupportedType {
            context: context.into(),
            kind: kind.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_config_creation() {
        let error = Error::config("unknown extension");
        assert!(matches!(error, Error::Config(_)));
        assert_eq!(error.to_string(), "Configuration error: unknown extension");
    }

    #[test]
    fn test_error_design_creation() {
        let error = Error::design("duplicate status code 200");
        assert!(matches!(error, Error::InvalidDesign(_)));
        assert_eq!(error.to_string(), "Invalid design: duplicate status code 200");
    }

    #[test]
    fn test_error_unsupported_type() {
        let error = Error::unsupported("path parameter \"id\"", "object");
        assert_eq!(
            error.to_string(),
            "Unsupported type object for path parameter \"id\""
        );
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
        assert!(error.to_string().contains("File not found"));
    }

    #[test]
    fn test_error_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
        assert!(error.to_string().contains("JSON parsing error"));
    }

    #[test]
    fn test_unknown_status_code_display() {
        assert_eq!(
            Error::UnknownStatusCode(799).to_string(),
            "Unknown HTTP status code: 799"
        );
    }
}

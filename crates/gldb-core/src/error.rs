// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for the generic linked database
//!
//! Every store implementation maps its engine-specific failures (parser,
//! I/O, transport) onto these variants so callers handle errors the same
//! way regardless of which store produced them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all store and orchestration operations
#[derive(Debug, Error, Serialize, Deserialize, PartialEq)]
pub enum StoreError {
    #[error("A store named '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Unsupported file type '{extension}' for {path}")]
    UnsupportedFileType { path: String, extension: String },

    #[error("Unsupported operation: {message}")]
    UnsupportedOperation { message: String },

    #[error("Query syntax error: {message}")]
    QuerySyntax { message: String },

    #[error("Query execution error: {message}")]
    ExecutionError { message: String },

    #[error("No data for dataset {dataset} (key '{key}')")]
    MissingData { dataset: String, key: String },

    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl StoreError {
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound { message: msg.into() }
    }

    pub fn store_not_found(name: &str) -> Self {
        Self::not_found(format!("no store registered under '{name}'"))
    }

    pub fn file_not_found(path: &std::path::Path) -> Self {
        Self::not_found(format!("file {} does not exist", path.display()))
    }

    pub fn unsupported_file_type(path: &std::path::Path) -> Self {
        Self::UnsupportedFileType {
            path: path.display().to_string(),
            extension: crate::types::file_extension(path).unwrap_or_default(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation { message: msg.into() }
    }

    pub fn syntax_error(msg: impl Into<String>) -> Self {
        Self::QuerySyntax { message: msg.into() }
    }

    pub fn execution_error(msg: impl Into<String>) -> Self {
        Self::ExecutionError { message: msg.into() }
    }

    pub fn missing_data(dataset: impl Into<String>, key: impl Into<String>) -> Self {
        Self::MissingData {
            dataset: dataset.into(),
            key: key.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration { message: msg.into() }
    }

    /// True for the lookup family of errors (unknown store, file or key).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::execution_error(err.to_string()),
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err: StoreError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.is_not_found());

        let err: StoreError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert!(matches!(err, StoreError::ExecutionError { .. }));
    }

    #[test]
    fn unsupported_file_type_carries_extension() {
        let err = StoreError::unsupported_file_type(std::path::Path::new("/tmp/data.CSV"));
        assert_eq!(
            err,
            StoreError::UnsupportedFileType {
                path: "/tmp/data.CSV".to_string(),
                extension: ".csv".to_string(),
            }
        );
    }

    #[test]
    fn messages_are_readable() {
        assert_eq!(
            StoreError::duplicate_name("rdf").to_string(),
            "A store named 'rdf' is already registered"
        );
        assert_eq!(
            StoreError::missing_data("https://example.org/ds", "t.csv").to_string(),
            "No data for dataset https://example.org/ds (key 't.csv')"
        );
    }
}

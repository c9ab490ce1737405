//! Error types for restload
//!
//! This module defines the error hierarchy for the whole pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for restload
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Request / Configuration Errors
    // ============================================================================
    #[error("Invalid request: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Remote API Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Remote API unreachable after {attempts} attempts: {message}")]
    Connectivity { message: String, attempts: u32 },

    #[error("Malformed response envelope: {message}")]
    Envelope { message: String },

    // ============================================================================
    // Schema Errors
    // ============================================================================
    #[error("Schema inference failed: {message}")]
    SchemaInference { message: String },

    // ============================================================================
    // Warehouse Errors
    // ============================================================================
    #[error("DDL failed: {message}")]
    Ddl { message: String },

    #[error("Bulk load failed: {message}")]
    BulkLoad { message: String },

    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a connectivity error
    pub fn connectivity(message: impl Into<String>, attempts: u32) -> Self {
        Self::Connectivity {
            message: message.into(),
            attempts,
        }
    }

    /// Create an envelope error
    pub fn envelope(message: impl Into<String>) -> Self {
        Self::Envelope {
            message: message.into(),
        }
    }

    /// Create a schema inference error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaInference {
            message: message.into(),
        }
    }

    /// Create a DDL error
    pub fn ddl(message: impl Into<String>) -> Self {
        Self::Ddl {
            message: message.into(),
        }
    }

    /// Create a bulk load error
    pub fn bulk_load(message: impl Into<String>) -> Self {
        Self::BulkLoad {
            message: message.into(),
        }
    }
}

/// Result type alias for restload
pub type Result<T> = std::result::Result<T, Error>;

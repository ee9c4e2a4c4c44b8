//! Error types for taxoflow operations.
//!
//! Only failures that leave no reasonable diagram to show are returned as
//! errors: dataset fetch and transform problems, and configuration problems.
//! Duplicate registrations, unknown nodes and layout-engine failures are
//! absorbed where they happen and logged.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for taxoflow operations.
#[derive(Debug, Error)]
pub enum TaxoflowError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Request for `{url}` failed with HTTP status {status}")]
    Http { url: String, status: u16 },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Unknown diagram `{0}`")]
    UnknownDiagram(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Dataset shape errors raised while turning raw JSON into a tree.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Dataset for `{diagram}` must be a JSON array, found {found}")]
    NotAnArray { diagram: String, found: &'static str },

    #[error("Malformed entity in `{diagram}` at {path}: {source}")]
    Entity {
        diagram: String,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No transform registered for `{0}`")]
    MissingTransform(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Failure reported by a layout engine. Never escapes the layout adapter.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Layout engine failed: {0}")]
    Engine(String),

    #[error("Layout engine panicked: {0}")]
    Panicked(String),

    #[error("Edge `{edge}` references unknown node `{node}`")]
    UnknownNode { edge: String, node: String },
}

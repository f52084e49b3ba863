//! Error types for block preprocessing.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use vernis_trame::MapError;

use crate::types::Position;

/// A compiler error remapped to file-absolute coordinates.
///
/// Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} ({}:{})", .start.line, .start.column)]
pub struct PositionedError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,
    pub start: Position,
    pub end: Position,
}

/// Error type for preprocessing operations.
#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    /// Parse error reported by a compiler, in file coordinates.
    #[error(transparent)]
    Positioned(#[from] PositionedError),

    /// No transformer is registered for the requested language.
    #[error("no transformer registered for `{name}`")]
    MissingTransformer { name: String },

    /// A transformer failed without position information.
    #[error("{transformer}: {message}")]
    Transform { transformer: String, message: String },

    /// A language attribute that is not a string.
    #[error("attribute `{name}` must be a string")]
    InvalidAttribute { name: String },

    /// Source map decoding or chaining failed.
    #[error("source map error: {0}")]
    SourceMap(#[from] MapError),

    /// An explicitly requested config file could not be loaded.
    #[error("failed to load {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl PreprocessError {
    pub fn transform(transformer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            transformer: transformer.into(),
            message: message.into(),
        }
    }
}

/// Result type for preprocessing operations.
pub type PreprocessResult<T> = Result<T, PreprocessError>;

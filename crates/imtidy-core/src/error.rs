//! Error types for imtidy-core

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for imtidy operations
pub type Result<T> = std::result::Result<T, TidyError>;

/// Main error type for imtidy operations
#[derive(Error, Debug)]
pub enum TidyError {
    /// A file could not be read or written
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The source root is missing or not a directory
    #[error("source directory not found: {}", .0.display())]
    SourceDirectory(PathBuf),

    /// The bibliography file is not valid BibTeX
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: imtidy_bibtex::ParseError,
    },

    /// The reviewer could not be asked or answered (closed input, broken
    /// terminal)
    #[error("review aborted: {0}")]
    Review(#[source] io::Error),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A report or configuration could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TidyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TidyError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for TidyError {
    fn from(err: serde_json::Error) -> Self {
        TidyError::Serialization(err.to_string())
    }
}

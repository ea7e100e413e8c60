//! Error types for tokencache
//!
//! All modules use `TokenCacheResult<T>` as their return type.

use crate::token::CodecError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tokencache operations
pub type TokenCacheResult<T> = Result<T, TokenCacheError>;

/// All errors that can occur in tokencache
#[derive(Error, Debug)]
pub enum TokenCacheError {
    // Cache protocol errors
    #[error("Failed to lock token cache {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode token cache {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("Failed to persist token cache {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl TokenCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Check if error is retryable
    ///
    /// Lock contention and I/O failures while persisting may clear up; a
    /// missing directory, denied access or an unserializable token will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Lock { source, .. } => !matches!(
                source.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ),
            Self::Persist { source, .. } => matches!(source, CodecError::Io(_)),
            _ => false,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Lock { .. } => {
                Some("Another process may be holding the cache lock. Try again shortly")
            }
            Self::Decode { .. } => {
                Some("The cache file is corrupt. Delete it or write a fresh token")
            }
            Self::Persist { .. } => {
                Some("Check free disk space and permissions on the cache directory")
            }
            Self::ConfigInvalid { .. } => Some("Run: tokencache config init --force"),
            _ => None,
        }
    }
}

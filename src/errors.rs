/*!
 * Error types for the sub2anki application.
 *
 * This module contains custom error types for the parts of the pipeline that
 * callers may want to tell apart, using the thiserror crate for ergonomic
 * error definitions. Everything else travels as `anyhow::Error` with context.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to a translation provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Quota or rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether retrying the same request later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Errors that can occur while reading a subtitle file
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The input file does not exist
    #[error("Subtitle file not found: {0}")]
    NotFound(PathBuf),

    /// The input file could not be read
    #[error("Failed to read subtitle file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but holds no usable entries
    #[error("No valid subtitle entries found in {0}")]
    NoEntries(PathBuf),
}

/// Errors raised by the persistent translation cache
#[derive(Error, Debug)]
pub enum CacheError {
    /// Underlying SQLite failure
    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The cache directory could not be prepared
    #[error("Cache file error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection lock was poisoned or a blocking task died
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// The on-disk schema is newer than this build understands
    #[error("Unsupported cache schema version {found} (expected at most {supported})")]
    UnsupportedSchema { found: i32, supported: i32 },

    /// A stored payload could not be decoded
    #[error("Corrupt cache entry for '{key}': {source}")]
    CorruptEntry {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The cache is still shared when it should be closed
    #[error("Cache is still in use and cannot be closed")]
    InUse,
}

/// Errors raised while writing a deck package
#[derive(Error, Debug)]
pub enum PackageError {
    /// Filesystem failure around the output file
    #[error("Package file error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure while building the collection database
    #[error("Collection database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failure while zipping the package
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Failure while encoding collection metadata
    #[error("Collection metadata error: {0}")]
    Json(#[from] serde_json::Error),

    /// The deck id is taken by the collection's built-in deck
    #[error("Deck id {0} is reserved for the built-in Default deck")]
    ReservedDeckId(u32),

    /// A note does not have one value per model field
    #[error("Note {index} has {found} fields, model '{model}' expects {expected}")]
    FieldMismatch {
        index: usize,
        found: usize,
        expected: usize,
        model: String,
    },
}

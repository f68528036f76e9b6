//! Error types for release planning operations
//!
//! Validation errors abort the operation before any write; nothing is
//! retried. The CLI maps each variant to a user-facing message.

use thiserror::Error;

/// Errors produced by the core library
#[derive(Debug, Error)]
pub enum Error {
    /// A required field was empty or absent
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A date string did not match DD/MM/YYYY or named an impossible day
    #[error("invalid date '{0}', use the DD/MM/YYYY format")]
    InvalidDate(String),

    /// A status string was not one of the four known values
    #[error("unknown status '{0}' (expected planned, in-progress, delivered or cancelled)")]
    InvalidStatus(String),

    /// Another product already uses this name (case-insensitive)
    #[error("a product named '{0}' already exists")]
    DuplicateName(String),

    /// Another product already uses this code (case-insensitive)
    #[error("a product with code '{0}' already exists")]
    DuplicateCode(String),

    /// The referenced record does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The database file was created by a newer version of the tool
    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaVersion { found: i32, supported: i32 },

    /// Underlying SQLite failure
    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    /// Filesystem failure while locating or creating the database
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure during export
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Convenience alias used throughout the core
pub type Result<T> = std::result::Result<T, Error>;

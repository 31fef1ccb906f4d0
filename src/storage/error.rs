//! Error types for storage operations

use std::fmt;

use super::migration::CopyStep;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Debug)]
pub enum StorageError {
    /// Backend unreachable, authentication failure, or probe failure
    Connection(String),

    /// Operation attempted after close; programmer error
    Closed,

    /// Creation of the table structure failed; fatal to open()
    Schema(String),

    /// A query against an open backend failed
    Query(String),

    /// Row data could not be decoded into its domain type
    Serialization(String),

    /// A batch-copy step failed mid-sequence; earlier steps remain committed
    /// in the destination, later steps were never attempted
    MigrationAborted {
        step: CopyStep,
        cause: Box<StorageError>,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Connection(msg) => {
                write!(f, "failed to connect to storage backend: {}", msg)
            }
            StorageError::Closed => write!(f, "storage backend has been closed"),
            StorageError::Schema(msg) => write!(f, "schema creation failed: {}", msg),
            StorageError::Query(msg) => write!(f, "storage query failed: {}", msg),
            StorageError::Serialization(msg) => {
                write!(f, "stored row could not be decoded: {}", msg)
            }
            StorageError::MigrationAborted { step, cause } => {
                write!(f, "batch copy aborted at step '{}': {}", step, cause)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::MigrationAborted { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(io_err) => StorageError::Connection(io_err.to_string()),
            sqlx::Error::PoolTimedOut => {
                StorageError::Connection("timed out waiting for a pooled connection".to_string())
            }
            sqlx::Error::PoolClosed => StorageError::Closed,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StorageError::Serialization(err.to_string())
            }
            _ => StorageError::Query(err.to_string()),
        }
    }
}

use std::io;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a ledger store
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO errors that occur when reading/writing files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Database errors that occur with the underlying storage backend
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization errors of the value envelope
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The requested key is absent from the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// The key cannot be used to address a ledger record
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// A conditional write observed a different version than the caller expected
    #[error("Version conflict on {key}: expected {expected:?}, found {actual:?}")]
    VersionConflict {
        key: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },

    /// Generic errors that don't fit in other categories
    #[error("Other error: {0}")]
    Other(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

impl StorageError {
    /// Whether this error is a failed conditional write that may succeed on retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::VersionConflict { .. })
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

#[cfg(feature = "rocksdb")]
impl From<rocksdb::Error> for StorageError {
    fn from(err: rocksdb::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound("Row not found".to_string()),
            _ => StorageError::Database(err.to_string()),
        }
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        StorageError::Other(err)
    }
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        StorageError::Other(err.to_string())
    }
}

/// Errors surfaced to the caller of a ledger operation
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A requested ledger key, owner entry or container is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// A payload or stored record does not match the expected record shape
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// The underlying store failed to read or write
    #[error("Store error: {0}")]
    Store(StorageError),

    /// A required argument is missing or empty
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The dispatcher received a name it does not route
    #[error("Received unknown function invocation: {0}")]
    UnknownOperation(String),

    /// A fenced update kept losing the race for a singleton record
    #[error("Gave up updating {key} after {attempts} conflicting attempts")]
    Conflict { key: String, attempts: u32 },
}

impl From<StorageError> for LedgerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => LedgerError::NotFound(key),
            other => LedgerError::Store(other),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Deserialization(err.to_string())
    }
}

/// Result alias used by ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_not_found_maps_to_ledger_not_found() {
        let err: LedgerError = StorageError::NotFound("CON7".to_string()).into();
        assert!(matches!(err, LedgerError::NotFound(ref key) if key == "CON7"));
    }

    #[test]
    fn test_other_storage_errors_map_to_store() {
        let err: LedgerError = StorageError::Database("disk full".to_string()).into();
        assert!(matches!(err, LedgerError::Store(StorageError::Database(_))));

        let conflict = StorageError::VersionConflict {
            key: "UniqueIDCounter".to_string(),
            expected: Some(1),
            actual: Some(2),
        };
        assert!(conflict.is_conflict());
        let err: LedgerError = conflict.into();
        assert!(matches!(err, LedgerError::Store(ref e) if e.is_conflict()));
    }

    #[test]
    fn test_json_errors_map_to_deserialization() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: LedgerError = err.into();
        assert!(matches!(err, LedgerError::Deserialization(_)));
    }
}

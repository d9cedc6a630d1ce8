//! Error types for Benchlog operations

use crate::{EntityKind, RowId};
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityKind, id: RowId },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityKind, reason: String },

    #[error("Duplicate {entity_type:?}: {reason}")]
    Duplicate { entity_type: EntityKind, reason: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Backend error: {reason}")]
    Backend { reason: String },

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Benchlog errors.
#[derive(Debug, Clone, Error)]
pub enum BenchError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl BenchError {
    /// Shorthand for a `StorageError::NotFound`.
    pub fn not_found(entity_type: EntityKind, id: RowId) -> Self {
        BenchError::Storage(StorageError::NotFound { entity_type, id })
    }

    /// Shorthand for a `ValidationError::InvalidValue`.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        BenchError::Validation(ValidationError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// True when the error means the referenced row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BenchError::Storage(StorageError::NotFound { .. }))
    }
}

/// Result type alias for Benchlog operations.
pub type BenchResult<T> = Result<T, BenchError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity_type: EntityKind::Record,
            id: 42,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("Record"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::InvalidValue {
            field: "ids".to_string(),
            reason: "must be a list".to_string(),
        };
        assert_eq!(format!("{}", err), "Invalid value for ids: must be a list");
    }

    #[test]
    fn test_bench_error_from_storage() {
        let err: BenchError = StorageError::LockPoisoned.into();
        assert!(matches!(err, BenchError::Storage(StorageError::LockPoisoned)));
        assert!(format!("{}", err).starts_with("Storage error"));
    }

    #[test]
    fn test_not_found_helper() {
        let err = BenchError::not_found(EntityKind::Equipment, 7);
        assert!(err.is_not_found());
        assert!(!BenchError::invalid("ids", "bad").is_not_found());
    }
}

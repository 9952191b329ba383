//! Database error types
//!
//! Errors raised while talking to PostgreSQL, and their translation into the
//! [`PortError`] vocabulary the billing engine understands.

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// An update found the row at a different version than expected
    #[error("Version conflict: {0}")]
    VersionConflict(String),

    /// Concurrent transactions could not be serialized
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Generic SQL error
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("invoices", "0190a1b2");
    /// assert!(error.to_string().contains("invoices"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    /// Creates a duplicate entry error
    pub fn duplicate(entity: &str, field: &str, value: impl std::fmt::Display) -> Self {
        DatabaseError::DuplicateEntry(format!(
            "{} with {} '{}' already exists",
            entity, field, value
        ))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if a competing writer caused this error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::VersionConflict(_)
                | DatabaseError::TransactionFailed(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }
}

/// Maps SQLx errors to specific variants by PostgreSQL error code
///
/// https://www.postgresql.org/docs/current/errcodes-appendix.html
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(e) => DatabaseError::ConnectionFailed(e.to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => DatabaseError::DuplicateEntry(db_err.message().to_string()),
                Some("23514") => DatabaseError::ConstraintViolation(db_err.message().to_string()),
                Some("40001") | Some("40P01") => {
                    DatabaseError::TransactionFailed(db_err.message().to_string())
                }
                _ => DatabaseError::QueryFailed(db_err.message().to_string()),
            },
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::SqlError(ref e) => {
                let mapped = DatabaseError::from(e);
                if matches!(mapped, DatabaseError::QueryFailed(_)) {
                    PortError::internal(error.to_string())
                } else {
                    PortError::from(mapped)
                }
            }
            DatabaseError::NotFound(message) => PortError::NotFound {
                entity_type: "document".to_string(),
                id: message,
            },
            e if e.is_conflict() => PortError::conflict(e.to_string()),
            DatabaseError::PoolExhausted => PortError::timeout("acquire pooled connection"),
            e if e.is_connection_error() => PortError::connection(e.to_string()),
            DatabaseError::SerializationError(message) => PortError::transformation(message),
            e => PortError::internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicts_map_to_port_conflict() {
        let port: PortError = DatabaseError::VersionConflict("invoices/1 at 3".into()).into();
        assert!(port.is_conflict());

        let port: PortError = DatabaseError::duplicate("payments", "id", "abc").into();
        assert!(port.is_conflict());
    }

    #[test]
    fn test_connection_errors_are_transient() {
        let port: PortError = DatabaseError::ConnectionFailed("refused".into()).into();
        assert!(matches!(port, PortError::Connection { .. }));
        assert!(port.is_transient());
    }

    #[test]
    fn test_pool_timeout_maps_to_port_timeout() {
        let port: PortError = DatabaseError::from(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(port, PortError::Timeout { .. }));
        assert!(port.is_transient());

        let port: PortError = DatabaseError::PoolExhausted.into();
        assert!(matches!(port, PortError::Timeout { .. }));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error = DatabaseError::from(&sqlx::Error::RowNotFound);
        assert!(error.is_not_found());
        assert!(PortError::from(error).is_not_found());
    }

    #[test]
    fn test_serialization_maps_to_transformation() {
        let port: PortError = DatabaseError::SerializationError("bad body".into()).into();
        assert!(matches!(port, PortError::Transformation { .. }));
    }
}

//! Error types for query execution.

use quarry_filter::FilterError;
use thiserror::Error;

/// A query setting that must be present before execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    /// The database name.
    Database,
    /// The table (collection) name.
    Table,
}

impl std::fmt::Display for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Setting::Database => write!(f, "database name"),
            Setting::Table => write!(f, "table name"),
        }
    }
}

/// Errors reported by a [`Store`](crate::Store) implementation.
///
/// These pass through the query layer unchanged, except `Unreachable`,
/// which surfaces as [`QueryError::Connection`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The server could not be reached.
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// The store client gave up waiting.
    #[error("store operation timed out: {0}")]
    Timeout(String),

    /// The store refused the operation (duplicate key, invalid update, ...).
    #[error("store rejected the operation: {0}")]
    Rejected(String),
}

/// Errors returned by terminal query operations.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A required setting was not provided before execution.
    #[error("{0} has not been set")]
    Configuration(Setting),

    /// The store was unreachable at construction time or at call time.
    #[error("could not connect to database: {reason}")]
    Connection { reason: String },

    /// The condition tree could not be compiled.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// The store failed the operation.
    #[error(transparent)]
    Store(StoreError),

    /// A value passed as a document did not serialize to a JSON object.
    #[error("expected a document (JSON object), got {found}")]
    NotADocument { found: &'static str },

    /// Converting between documents and typed values failed.
    #[error("document conversion failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unreachable(reason) => QueryError::Connection { reason },
            other => QueryError::Store(other),
        }
    }
}

/// Errors raised while loading [`Config`](crate::Config).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The port variable is not a valid TCP port.
    #[error("invalid port '{value}' in {var}")]
    InvalidPort { var: &'static str, value: String },
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_becomes_connection_error() {
        let err: QueryError = StoreError::Unreachable("refused".into()).into();
        assert!(matches!(err, QueryError::Connection { ref reason } if reason == "refused"));
    }

    #[test]
    fn other_store_errors_pass_through() {
        let err: QueryError = StoreError::Timeout("server selection".into()).into();
        assert!(matches!(err, QueryError::Store(StoreError::Timeout(_))));
        assert_eq!(
            err.to_string(),
            "store operation timed out: server selection"
        );
    }

    #[test]
    fn configuration_messages() {
        assert_eq!(
            QueryError::Configuration(Setting::Table).to_string(),
            "table name has not been set"
        );
        assert_eq!(
            QueryError::Configuration(Setting::Database).to_string(),
            "database name has not been set"
        );
    }
}

//! Error types for the filter crate.

use thiserror::Error;

/// Errors that can occur while compiling conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// `end_group` was called with no nested group open.
    #[error("no condition group is open")]
    UnbalancedGroup,

    /// `compile` was called while nested groups were still open.
    #[error("{open} condition group(s) still open")]
    UnclosedGroup { open: usize },
}

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;

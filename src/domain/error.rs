//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors are programmer errors detected at the offending call.
/// Missing ids, dangling relations and cycles are valid data, never errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{}", invalid_input_message(.index, .message))]
    InvalidInput {
        /// Position in the declared branch list, `None` for query-time input
        index: Option<usize>,
        message: String,
    },

    #[error("Branch '{0}' does not exist")]
    UnknownBranch(String),
}

fn invalid_input_message(index: &Option<usize>, message: &str) -> String {
    match index {
        Some(idx) => format!("Branch at index '{idx}' {message}"),
        None => format!("Branch {message}"),
    }
}

impl DomainError {
    pub(crate) fn not_scalar(index: Option<usize>) -> Self {
        Self::InvalidInput {
            index,
            message: "is not a scalar value".to_string(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

use thiserror::Error;

/// Errors raised by the uncover and indexing entry points
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UncoverError {
    /// A required argument was missing or empty
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl UncoverError {
    pub(crate) fn missing_name(operation: &str, role: &str) -> Self {
        UncoverError::InvalidArgument(format!(
            "{operation} requires a non-empty name for {role}"
        ))
    }
}

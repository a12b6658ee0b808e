#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend (language server or graph store) cannot be reached any more.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    /// A single query failed; other files can still be processed.
    #[error("Query {method} failed: {message}")]
    Query { method: String, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn query(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Fatal errors abort a whole build; the rest are isolated to one file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Internal(_))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

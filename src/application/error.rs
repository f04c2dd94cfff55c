use crate::infrastructure::database::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("{0}")]
    Validation(String),

    #[error("Resource not found")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResourceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ResourceError::Validation(message.into())
    }

    /// Maps a storage failure for `id`, keeping not-found distinct.
    pub(crate) fn from_repository(id: &str, error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound => ResourceError::NotFound(id.to_string()),
            other => ResourceError::Internal(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ResourceError {
    fn from(error: RepositoryError) -> Self {
        ResourceError::Internal(error.to_string())
    }
}

use mirror_core::{BadParameters, EntityIdError};
use mirror_kit::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error(transparent)]
    BadParameters(#[from] BadParameters),

    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    /// Keeps the whole `anyhow` chain in the message.
    pub fn database(cause: anyhow::Error) -> Self {
        Self::Database {
            message: format!("{cause:#}"),
        }
    }
}

impl From<EntityIdError> for DomainError {
    fn from(e: EntityIdError) -> Self {
        Self::BadParameters(e.into())
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::BadParameters(bad) => ApiError::BadParameters(bad),
            DomainError::NotFound { .. } => ApiError::NotFound,
            DomainError::Database { message } => ApiError::Internal(message),
        }
    }
}

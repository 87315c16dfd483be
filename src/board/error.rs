use thiserror::Error;

use crate::LoadError;

/// Failure reported by a [`JobStore`](super::JobStore).
///
/// `Clone` so a single failed company batch can be handed to every resolver waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid seed data: {0}")]
    InvalidSeed(String),
}

/// Resolver error, carrying the GraphQL extension code clients match on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("database error: {0}")]
    Store(#[from] StoreError),
    #[error("company loader is no longer running")]
    LoaderClosed,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Store(_) | ApiError::LoaderClosed => "INTERNAL_SERVER_ERROR",
        }
    }

    pub(crate) fn missing_authentication() -> Self {
        ApiError::Unauthorized("Missing authentication".to_owned())
    }
}

impl From<LoadError<StoreError>> for ApiError {
    fn from(e: LoadError<StoreError>) -> Self {
        match e {
            LoadError::Fetch(e) => ApiError::Store(e),
            LoadError::WorkerClosed => ApiError::LoaderClosed,
        }
    }
}

use thiserror::Error;

use crate::error::HttpError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Payment(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn stale() -> Self {
        ServiceError::Conflict(
            "Verification was modified by another request. Reload and try again".to_string(),
        )
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        let unique_violation = err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation());

        if unique_violation {
            ServiceError::Conflict("Resource already exists".to_string())
        } else {
            ServiceError::Database(err)
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Validation(_) | ServiceError::Payment(_) => {
                HttpError::bad_request(error.to_string())
            }
            ServiceError::NotFound(_) => HttpError::not_found(error.to_string()),
            ServiceError::Forbidden(_) => HttpError::forbidden(error.to_string()),
            ServiceError::Conflict(_) => HttpError::conflict(error.to_string()),
            ServiceError::Database(_) | ServiceError::Unexpected(_) => HttpError::internal(error),
        }
    }
}

use thiserror::Error;

use crate::account::RepositoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn http_status(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 400,
            AuthError::EmailTaken => 409,
            AuthError::InvalidCredentials | AuthError::InvalidToken => 401,
            AuthError::Internal(_) => 500,
        }
    }
}

impl From<RepositoryError> for AuthError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::EmailTaken => AuthError::EmailTaken,
            RepositoryError::Database(e) => AuthError::Internal(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(e: validator::ValidationErrors) -> Self {
        AuthError::Validation(e.to_string())
    }
}

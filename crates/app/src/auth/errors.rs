//! Auth service errors.

use thiserror::Error;

use crate::{
    auth::TokenError,
    database::{Violation, violation},
};

#[derive(Debug, Error)]
pub enum AuthServiceError {
    /// Unknown, revoked, expired, or unverifiable token; also an unknown user
    /// when issuing.
    #[error("token not found")]
    NotFound,

    #[error("storage error")]
    Sql(#[source] sqlx::Error),

    #[error("token processing error")]
    Token(#[from] TokenError),
}

impl From<sqlx::Error> for AuthServiceError {
    fn from(error: sqlx::Error) -> Self {
        match violation(&error) {
            Some(Violation::RowNotFound | Violation::ForeignKey) => Self::NotFound,
            _ => Self::Sql(error),
        }
    }
}

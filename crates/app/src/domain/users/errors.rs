//! Users service errors.

use thiserror::Error;

use crate::database::{Violation, violation};

#[derive(Debug, Error)]
pub enum UsersServiceError {
    #[error("a user with this uuid or email already exists")]
    AlreadyExists,

    #[error("user not found")]
    NotFound,

    #[error("invalid user data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for UsersServiceError {
    fn from(error: sqlx::Error) -> Self {
        match violation(&error) {
            Some(Violation::RowNotFound) => Self::NotFound,
            Some(Violation::Unique) => Self::AlreadyExists,
            Some(Violation::Check | Violation::NotNull | Violation::ForeignKey) => {
                Self::InvalidData
            }
            None => Self::Sql(error),
        }
    }
}

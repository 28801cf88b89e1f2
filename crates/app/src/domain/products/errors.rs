//! Products service errors.

use thiserror::Error;

use crate::database::{Violation, violation};

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product already exists")]
    AlreadyExists,

    #[error("product not found")]
    NotFound,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for ProductsServiceError {
    fn from(error: sqlx::Error) -> Self {
        match violation(&error) {
            Some(Violation::RowNotFound) => Self::NotFound,
            Some(Violation::Unique) => Self::AlreadyExists,
            Some(Violation::NotNull) => Self::MissingRequiredData,
            Some(Violation::Check | Violation::ForeignKey) => Self::InvalidData,
            None => Self::Sql(error),
        }
    }
}

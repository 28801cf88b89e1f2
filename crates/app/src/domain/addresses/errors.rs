//! Addresses service errors.

use thiserror::Error;

use crate::database::{Violation, violation};

#[derive(Debug, Error)]
pub enum AddressesServiceError {
    #[error("address already exists")]
    AlreadyExists,

    /// Unknown address, or one that belongs to another user.
    #[error("address not found")]
    NotFound,

    #[error("address is missing required fields: {}", .0.join(", "))]
    MissingRequiredData(Vec<&'static str>),

    #[error("invalid address data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for AddressesServiceError {
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

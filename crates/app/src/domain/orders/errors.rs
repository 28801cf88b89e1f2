//! Orders service errors.

use thiserror::Error;

use crate::database::{Violation, violation};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    /// The order uuid, or the payment intent backing it, is already used.
    #[error("order already exists")]
    AlreadyExists,

    #[error("order not found")]
    NotFound,

    #[error("an order needs at least one item")]
    NoItems,

    #[error("invalid order data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for OrdersServiceError {
    fn from(error: sqlx::Error) -> Self {
        match violation(&error) {
            Some(Violation::RowNotFound) => Self::NotFound,
            Some(Violation::Unique) => Self::AlreadyExists,
            Some(Violation::ForeignKey | Violation::NotNull | Violation::Check) => {
                Self::InvalidData
            }
            None => Self::Sql(error),
        }
    }
}

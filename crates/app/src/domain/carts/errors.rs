//! Carts service errors.

use thiserror::Error;

use crate::database::{Violation, violation};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    /// The product is not in the user's cart.
    #[error("cart item not found")]
    NotFound,

    /// The product does not exist or is no longer sold.
    #[error("product not found")]
    ProductNotFound,

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("invalid cart data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for CartsServiceError {
    fn from(error: sqlx::Error) -> Self {
        match violation(&error) {
            Some(Violation::RowNotFound) => Self::NotFound,
            Some(Violation::ForeignKey) => Self::ProductNotFound,
            Some(Violation::Unique | Violation::NotNull | Violation::Check) => Self::InvalidData,
            None => Self::Sql(error),
        }
    }
}

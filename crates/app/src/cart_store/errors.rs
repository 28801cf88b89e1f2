//! Cart store errors.

use thiserror::Error;

use crate::{
    auth::AuthServiceError,
    domain::{carts::CartsServiceError, products::ProductsServiceError},
    pricing::PricingError,
};

#[derive(Debug, Error)]
pub enum GuestCartError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("a product is required")]
    MissingProduct,

    #[error("product is not in the cart")]
    NotInCart,

    #[error("failed to encode guest cart snapshot")]
    Encode(#[source] serde_json::Error),

    #[error("failed to load product for pricing")]
    Catalog(#[source] ProductsServiceError),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

#[derive(Debug, Error)]
pub enum ServerCartError {
    #[error(transparent)]
    Carts(#[from] CartsServiceError),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl ServerCartError {
    /// Storage failures that may succeed on retry, as opposed to the server
    /// refusing the change.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Carts(CartsServiceError::Sql(_)))
    }
}

#[derive(Debug, Error)]
pub enum CartMergeError {
    #[error("failed to record cart merge")]
    Auth(#[from] AuthServiceError),

    #[error("failed to refresh cart after merge")]
    Server(#[from] ServerCartError),

    #[error(transparent)]
    Guest(#[from] GuestCartError),
}

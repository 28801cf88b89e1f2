//! Cart Errors

use salvo::http::StatusError;
use tracing::error;

use storefront_app::{
    auth::AuthServiceError,
    cart_store::{CartMergeError, GuestCartError, ServerCartError},
    domain::carts::CartsServiceError,
    pricing::PricingError,
};

pub(crate) fn into_status_error(error: ServerCartError) -> StatusError {
    match error {
        ServerCartError::Carts(error) => carts_status_error(error),
        ServerCartError::Pricing(error) => pricing_status_error(&error),
    }
}

pub(crate) fn carts_status_error(error: CartsServiceError) -> StatusError {
    match error {
        CartsServiceError::NotFound => StatusError::not_found().brief("Product is not in the cart"),
        CartsServiceError::ProductNotFound => {
            StatusError::not_found().brief("Product not found or no longer sold")
        }
        CartsServiceError::InvalidQuantity => {
            StatusError::bad_request().brief("Quantity must be at least 1")
        }
        CartsServiceError::InvalidData => StatusError::bad_request().brief("Invalid cart data"),
        CartsServiceError::Sql(source) => {
            error!("cart storage failed: {source}");

            StatusError::internal_server_error()
        }
    }
}

pub(crate) fn pricing_status_error(error: &PricingError) -> StatusError {
    error!("failed to price cart: {error}");

    StatusError::internal_server_error()
}

pub(crate) fn guest_status_error(error: GuestCartError) -> StatusError {
    match error {
        GuestCartError::InvalidQuantity | GuestCartError::MissingProduct => {
            StatusError::bad_request().brief(error.to_string())
        }
        GuestCartError::NotInCart => StatusError::not_found().brief("Product is not in the cart"),
        GuestCartError::Encode(source) => {
            error!("failed to encode guest cart: {source}");

            StatusError::internal_server_error()
        }
        GuestCartError::Catalog(source) => {
            error!("failed to load products for guest cart: {source}");

            StatusError::internal_server_error()
        }
        GuestCartError::Pricing(error) => pricing_status_error(&error),
    }
}

pub(crate) fn merge_status_error(error: CartMergeError) -> StatusError {
    match error {
        CartMergeError::Auth(AuthServiceError::NotFound) => {
            StatusError::unauthorized().brief("Session is no longer valid")
        }
        CartMergeError::Auth(source) => {
            error!("failed to record cart merge: {source}");

            StatusError::internal_server_error()
        }
        CartMergeError::Server(error) => into_status_error(error),
        CartMergeError::Guest(error) => guest_status_error(error),
    }
}

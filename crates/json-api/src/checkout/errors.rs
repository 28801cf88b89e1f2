//! Checkout Errors

use salvo::http::StatusError;
use tracing::{error, warn};

use storefront_app::checkout::CheckoutError;

use crate::carts::errors::{carts_status_error, pricing_status_error};

pub(crate) fn into_status_error(error: CheckoutError) -> StatusError {
    match error {
        CheckoutError::Validation { missing } => StatusError::unprocessable_entity()
            .brief(format!("Missing required checkout fields: {}", missing.join(", "))),
        CheckoutError::EmptyCart => StatusError::conflict().brief("Cart is empty"),
        CheckoutError::CheckoutInProgress => {
            StatusError::conflict().brief("A checkout is already in progress")
        }
        CheckoutError::AlreadyFulfilled { payment_intent_id } => StatusError::conflict()
            .brief(format!("Payment intent {payment_intent_id} already has an order")),
        CheckoutError::ForeignPaymentIntent => {
            StatusError::forbidden().brief("Payment intent belongs to another user")
        }
        CheckoutError::AmountMismatch {
            payment_intent_id,
            source,
        } => StatusError::conflict().brief(format!(
            "Cart changed since payment intent {payment_intent_id} was created: {source}"
        )),
        CheckoutError::PaymentNotCompleted { status } => StatusError::payment_required()
            .brief(format!("Payment not completed (status: {status})")),
        CheckoutError::PaymentProvider(source) => {
            warn!("payment provider rejected request: {source}");

            StatusError::bad_gateway().brief("Payment provider rejected the request")
        }
        CheckoutError::Network(source) => {
            warn!("payment provider unreachable: {source}");

            StatusError::service_unavailable().brief("Payment provider is unreachable")
        }
        CheckoutError::Cancelled => {
            StatusError::service_unavailable().brief("Checkout was cancelled")
        }
        CheckoutError::OrderPersistence {
            payment_intent_id,
            source,
        } => {
            error!(%payment_intent_id, "order persistence failed: {source}");

            StatusError::internal_server_error().brief(format!(
                "Payment {payment_intent_id} was captured but the order could not be saved"
            ))
        }
        CheckoutError::Cart(source) => carts_status_error(source),
        CheckoutError::Addresses(source) => {
            error!("failed to read saved addresses: {source}");

            StatusError::internal_server_error()
        }
        CheckoutError::Pricing(source) => pricing_status_error(&source),
    }
}

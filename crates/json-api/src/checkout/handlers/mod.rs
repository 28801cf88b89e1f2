//! Checkout Handlers

pub(crate) mod confirm;
pub(crate) mod intents;
pub(crate) mod run;
pub(crate) mod validate;

use salvo::http::StatusError;

use storefront_app::checkout::CheckoutError;

use crate::{checkout::errors::into_status_error, observability::record_checkout_outcome};

/// Count the outcome of a checkout step and map failures to a status error.
pub(crate) fn track<T>(step: &str, result: Result<T, CheckoutError>) -> Result<T, StatusError> {
    match result {
        Ok(value) => {
            record_checkout_outcome(step, "success");

            Ok(value)
        }
        Err(error) => {
            record_checkout_outcome(step, error.code());

            Err(into_status_error(error))
        }
    }
}

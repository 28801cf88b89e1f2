//! Checkout Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};
use tracing::error;

use storefront_app::checkout::{
    CheckoutCancellation, CheckoutRequest, CheckoutResult, CheckoutState,
};

use crate::{
    checkout::{
        errors::into_status_error,
        models::{CheckoutRequestBody, ReceiptResponse},
    },
    extensions::*,
    observability::record_checkout_outcome,
    state::State,
};

/// Checkout Handler
///
/// Runs the whole checkout in one request: validates addresses, creates and
/// confirms the payment, records the order and empties the cart. Failures
/// report the last step that completed.
#[endpoint(
    tags("checkout"),
    summary = "Checkout",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Order placed"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Required fields missing"),
        (status_code = StatusCode::CONFLICT, description = "Cart is empty or checkout already running"),
        (status_code = StatusCode::PAYMENT_REQUIRED, description = "Payment not completed"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Payment provider rejected the request"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Payment provider unreachable"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "checkout.run",
    skip(json, depot, res),
    fields(
        user_uuid = tracing::field::Empty,
        checkout_state = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CheckoutRequestBody>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ReceiptResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.session_or_401()?.user_uuid();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));

    let request = CheckoutRequest::from(json.into_inner());

    let result = state
        .app
        .checkout
        .run(user, &request, &CheckoutCancellation::never())
        .await;

    record_checkout_outcome("run", result.outcome());

    match result {
        CheckoutResult::Receipt(receipt) => {
            span.record("checkout_state", CheckoutState::Done.as_str());

            res.status_code(StatusCode::CREATED);

            Ok(Json(receipt.into()))
        }
        CheckoutResult::Failed(failure) => {
            span.record("checkout_state", failure.last_state.as_str());

            Err(into_status_error(failure.error)
                .detail(format!("checkout stopped after {}", failure.last_state)))
        }
        other => {
            error!(state = %other.state(), "checkout ended before placing an order");

            Err(StatusError::internal_server_error())
        }
    }
}

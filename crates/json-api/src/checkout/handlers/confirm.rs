//! Confirm Payment Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};

use storefront_app::checkout::CheckoutRequest;

use crate::{
    checkout::{
        handlers::track,
        models::{CheckoutRequestBody, ReceiptResponse},
    },
    extensions::*,
    state::State,
};

/// Confirm Payment Handler
///
/// Confirms a payment intent, records the order and empties the cart.
#[endpoint(
    tags("checkout"),
    summary = "Confirm Payment",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Order placed"),
        (status_code = StatusCode::PAYMENT_REQUIRED, description = "Payment not completed"),
        (status_code = StatusCode::FORBIDDEN, description = "Payment intent belongs to another user"),
        (status_code = StatusCode::CONFLICT, description = "Payment intent already has an order"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Required fields missing"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "checkout.intents.confirm",
    skip(intent, json, depot, res),
    fields(
        user_uuid = tracing::field::Empty,
        payment_intent_id = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    intent: PathParam<String>,
    json: JsonBody<CheckoutRequestBody>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ReceiptResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.session_or_401()?.user_uuid();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));
    span.record("payment_intent_id", intent.as_str());

    let request = CheckoutRequest::from(json.into_inner());
    let checkout = &state.app.checkout;

    let validated = track("validate", checkout.validate(user, &request).await)?;
    let receipt = track(
        "complete",
        checkout.complete(&validated, intent.as_str()).await,
    )?;

    res.status_code(StatusCode::CREATED);

    Ok(Json(receipt.into()))
}

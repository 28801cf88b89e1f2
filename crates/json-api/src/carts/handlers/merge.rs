//! Merge Guest Cart Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};

use storefront_app::cart_store::MergeOutcome;

use crate::{
    carts::{
        errors::merge_status_error,
        handlers::cart_json,
        models::{GuestCartRequest, MergeCartResponse},
    },
    extensions::*,
    state::State,
};

/// Merge Guest Cart Handler
///
/// Adds a guest cart snapshot to the server cart once per session. Entries the
/// server refuses are reported and skipped. If the cart store fails every
/// entry the merge is deferred and can be retried with the same token.
#[endpoint(
    tags("cart"),
    summary = "Merge Guest Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Guest cart merged or merge already done"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.merge",
    skip(json, depot),
    fields(
        user_uuid = tracing::field::Empty,
        guest_items = tracing::field::Empty,
        status = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<GuestCartRequest>,
    depot: &mut Depot,
) -> Result<Json<MergeCartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.session_or_401()?;
    let items = json.into_inner().items;

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(session.user_uuid()));
    span.record("guest_items", items.len());

    let report = state
        .app
        .cart_merger
        .merge_snapshot(session, items.into_iter().map(Into::into).collect())
        .await
        .map_err(merge_status_error)?;

    let Json(cart) = cart_json(state, &report.cart)?;

    let discard_guest_cart = report.outcome.discards_guest_cart();

    let (status, merged, failed) = match report.outcome {
        MergeOutcome::Skipped => ("skipped", Vec::new(), Vec::new()),
        MergeOutcome::Merged { merged, failed } => ("merged", merged, failed),
        MergeOutcome::Deferred { failed } => ("deferred", Vec::new(), failed),
    };

    let response = MergeCartResponse {
        status: status.to_string(),
        discard_guest_cart,
        merged: merged.into_iter().map(Into::into).collect(),
        failed: failed.into_iter().map(Into::into).collect(),
        cart,
    };

    span.record("status", response.status.as_str());

    Ok(Json(response))
}

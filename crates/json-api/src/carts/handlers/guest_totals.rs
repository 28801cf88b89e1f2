//! Guest Cart Totals Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};

use storefront_app::cart_store::{GuestCart, InMemoryGuestStorage};

use crate::{
    carts::{
        errors::{guest_status_error, pricing_status_error},
        models::{GuestCartRequest, GuestTotalsResponse},
    },
    extensions::*,
    state::State,
};

/// Guest Cart Totals Handler
///
/// Prices a guest cart snapshot at current product prices. Products that no
/// longer exist are listed as unavailable and left out of the total.
#[endpoint(
    tags("cart"),
    summary = "Price Guest Cart",
    responses(
        (status_code = StatusCode::OK, description = "Priced guest cart"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.guest_totals",
    skip(json, depot),
    fields(guest_items = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<GuestCartRequest>,
    depot: &mut Depot,
) -> Result<Json<GuestTotalsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let items = json.into_inner().items;

    tracing::Span::current().record("guest_items", items.len());

    let guest = GuestCart::from_items(
        InMemoryGuestStorage::new(),
        items.into_iter().map(Into::into).collect(),
    )
    .map_err(guest_status_error)?;

    let priced = guest
        .totals(state.app.products.as_ref())
        .await
        .map_err(guest_status_error)?;

    GuestTotalsResponse::new(priced, state.app.checkout.config().currency())
        .map(Json)
        .map_err(|error| pricing_status_error(&error))
}

//! Guest Cart Add Item Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};

use storefront_app::cart_store::{GuestCart, InMemoryGuestStorage};

use crate::{
    carts::{
        errors::guest_status_error,
        models::{GuestAddItemRequest, GuestSnapshotResponse},
    },
    extensions::*,
    state::State,
};

/// Guest Cart Add Item Handler
///
/// Adds a catalog product to a guest cart snapshot and returns the updated
/// snapshot. Unknown products are refused and the snapshot is not changed.
#[endpoint(
    tags("cart"),
    summary = "Add Guest Cart Item",
    responses(
        (status_code = StatusCode::OK, description = "Updated guest snapshot"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unknown product or invalid quantity"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.guest_add_item",
    skip(json, depot),
    fields(product_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<GuestAddItemRequest>,
    depot: &mut Depot,
) -> Result<Json<GuestSnapshotResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();

    tracing::Span::current().record(
        "product_uuid",
        tracing::field::display(request.product_uuid),
    );

    let mut guest = GuestCart::from_items(
        InMemoryGuestStorage::new(),
        request.items.into_iter().map(Into::into).collect(),
    )
    .map_err(guest_status_error)?;

    guest
        .add_item_checked(
            state.app.products.as_ref(),
            request.product_uuid.into(),
            request.quantity,
        )
        .await
        .map_err(guest_status_error)?;

    Ok(Json(GuestSnapshotResponse {
        items: guest.items().iter().copied().map(Into::into).collect(),
    }))
}

//! Clear Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use storefront_app::cart_store::ServerCartStore;

use crate::{
    carts::{errors::into_status_error, handlers::cart_json, models::CartResponse},
    extensions::*,
    state::State,
};

/// Clear Cart Handler
#[endpoint(
    tags("cart"),
    summary = "Clear Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart cleared"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.clear",
    skip(depot),
    fields(user_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.session_or_401()?.user_uuid();

    tracing::Span::current().record("user_uuid", tracing::field::display(user));

    let mut store = ServerCartStore::new(Arc::clone(&state.app.carts), user);

    let cart = store.clear().await.map_err(into_status_error)?;

    tracing::info!("cleared cart");

    cart_json(state, cart)
}

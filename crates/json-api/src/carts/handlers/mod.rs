//! Cart Handlers

use salvo::prelude::{Json, StatusError};

use storefront_app::domain::carts::records::Cart;

use crate::{
    carts::{errors::pricing_status_error, models::CartResponse},
    state::State,
};

pub(crate) mod clear;
pub(crate) mod get;
pub(crate) mod guest_add;
pub(crate) mod guest_totals;
pub(crate) mod merge;

/// Render a server cart in the checkout currency.
pub(crate) fn cart_json(state: &State, cart: &Cart) -> Result<Json<CartResponse>, StatusError> {
    CartResponse::new(cart, state.app.checkout.config().currency())
        .map(Json)
        .map_err(|error| pricing_status_error(&error))
}

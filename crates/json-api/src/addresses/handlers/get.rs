//! Get Address Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    addresses::{errors::into_status_error, models::AddressResponse},
    extensions::*,
    state::State,
};

/// Get Address Handler
#[endpoint(
    tags("addresses"),
    summary = "Get Address",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Address found"),
        (status_code = StatusCode::NOT_FOUND, description = "Address not found"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
    ),
)]
#[tracing::instrument(
    name = "addresses.get",
    skip(address, depot),
    fields(
        user_uuid = tracing::field::Empty,
        address_uuid = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    address: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<AddressResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.session_or_401()?.user_uuid();
    let address = address.into_inner();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));
    span.record("address_uuid", tracing::field::display(address));

    let address = state
        .app
        .addresses
        .get_address(user, address.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(address.into()))
}

//! Create Address Handler

use std::sync::Arc;

use salvo::{
    http::{HeaderValue, header::LOCATION},
    oapi::extract::JsonBody,
    prelude::*,
};

use storefront_app::domain::addresses::{data::NewAddress, records::AddressUuid};

use crate::{
    addresses::{
        errors::into_status_error,
        models::{AddressPayload, AddressResponse},
    },
    extensions::*,
    state::State,
};

/// Create Address Handler
#[endpoint(
    tags("addresses"),
    summary = "Save Address",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Address saved"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Required fields missing"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "addresses.create",
    skip(json, depot, res),
    fields(
        user_uuid = tracing::field::Empty,
        address_uuid = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<AddressPayload>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<AddressResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.session_or_401()?.user_uuid();
    let uuid = AddressUuid::new();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));
    span.record("address_uuid", tracing::field::display(uuid));

    let address = state
        .app
        .addresses
        .create_address(NewAddress {
            uuid,
            user_uuid: user,
            address: json.into_inner().into(),
        })
        .await
        .map_err(into_status_error)?;

    let location = HeaderValue::from_str(&format!("/addresses/{}", address.uuid))
        .or_500("failed to encode address location header")?;

    res.headers_mut().insert(LOCATION, location);
    res.status_code(StatusCode::CREATED);

    Ok(Json(address.into()))
}

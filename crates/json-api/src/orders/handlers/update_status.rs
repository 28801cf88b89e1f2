//! Update Order Status Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};
use uuid::Uuid;

use storefront_app::domain::orders::records::OrderStatus;

use crate::{
    extensions::*,
    orders::{
        errors::into_status_error,
        models::{OrderResponse, UpdateOrderStatusRequest},
    },
    state::State,
};

/// Update Order Status Handler
///
/// Administrators move orders between fulfilment states.
#[endpoint(
    tags("orders"),
    summary = "Update Order Status",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order status updated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unknown status"),
        (status_code = StatusCode::FORBIDDEN, description = "Administrator access required"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
    ),
)]
#[tracing::instrument(
    name = "orders.update_status",
    skip(order, json, depot),
    fields(
        user_uuid = tracing::field::Empty,
        order_uuid = tracing::field::Empty,
        status = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<UpdateOrderStatusRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let admin = depot.admin_session_or_403()?.user_uuid();
    let order = order.into_inner();

    let status: OrderStatus = json
        .into_inner()
        .status
        .parse::<OrderStatus>()
        .map_err(|error| StatusError::bad_request().brief(error.to_string()))?;

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(admin));
    span.record("order_uuid", tracing::field::display(order));
    span.record("status", status.as_str());

    let updated = state
        .app
        .orders
        .update_status(order.into(), status)
        .await
        .map_err(into_status_error)?;

    Ok(Json(updated.into()))
}

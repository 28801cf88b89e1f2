//! List Orders Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, models::OrderResponse},
    state::State,
};

/// List Orders Handler
///
/// Returns the user's orders, newest first.
#[endpoint(
    tags("orders"),
    summary = "List Orders",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order history"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.index",
    skip(depot),
    fields(user_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<Vec<OrderResponse>>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.session_or_401()?.user_uuid();

    tracing::Span::current().record("user_uuid", tracing::field::display(user));

    let orders = state
        .app
        .orders
        .list_user_orders(user)
        .await
        .map_err(into_status_error)?;

    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::{
        orders::{MockOrdersService, records::OrderUuid},
        products::records::ProductUuid,
    };

    use crate::test_helpers::{TEST_USER_UUID, TestServices, make_order, make_product};

    use super::*;

    #[tokio::test]
    async fn test_index_returns_order_history_with_items() -> TestResult {
        let lamp = make_product(ProductUuid::new(), 25_00);
        let first = make_order(OrderUuid::new(), &lamp, 2);
        let second = make_order(OrderUuid::new(), &lamp, 1);
        let newest = second.uuid;

        let mut orders = MockOrdersService::new();

        orders
            .expect_list_user_orders()
            .once()
            .withf(|user| *user == TEST_USER_UUID)
            .return_once(move |_| Ok(vec![second, first]));

        let service = TestServices {
            orders,
            ..TestServices::default()
        }
        .service(Router::with_path("orders").get(handler));

        let mut res = TestClient::get("http://example.com/orders")
            .send(&service)
            .await;

        let body: Vec<OrderResponse> = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.len(), 2);
        assert_eq!(body.first().map(|o| o.uuid), Some(newest.into_uuid()));
        assert_eq!(body.first().map(|o| o.total_amount), Some(25_00));
        assert_eq!(
            body.first().and_then(|o| o.items.first()).map(|i| i.product_name.as_str()),
            Some("Desk Lamp")
        );

        Ok(())
    }
}

//! Get Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use storefront_app::domain::orders::OrdersServiceError;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, models::OrderResponse},
    state::State,
};

/// Get Order Handler
///
/// Users see their own orders; administrators see any order.
#[endpoint(
    tags("orders"),
    summary = "Get Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order found"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
    ),
)]
#[tracing::instrument(
    name = "orders.get",
    skip(order, depot),
    fields(
        user_uuid = tracing::field::Empty,
        order_uuid = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.session_or_401()?;
    let order = order.into_inner();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(session.user_uuid()));
    span.record("order_uuid", tracing::field::display(order));

    let order = state
        .app
        .orders
        .find_order(order.into())
        .await
        .map_err(into_status_error)?;

    if order.user_uuid != session.user_uuid() && !session.is_admin() {
        return Err(into_status_error(OrdersServiceError::NotFound));
    }

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::{
        orders::{
            MockOrdersService,
            records::{OrderRecord, OrderUuid},
        },
        products::records::ProductUuid,
        users::records::UserUuid,
    };

    use crate::test_helpers::{TestServices, make_order, make_product};

    use super::*;

    fn orders_returning(order: OrderRecord) -> MockOrdersService {
        let mut orders = MockOrdersService::new();
        let uuid = order.uuid;

        orders
            .expect_find_order()
            .once()
            .withf(move |o| *o == uuid)
            .return_once(move |_| Ok(order));

        orders
    }

    #[tokio::test]
    async fn test_get_own_order() -> TestResult {
        let uuid = OrderUuid::new();
        let order = make_order(uuid, &make_product(ProductUuid::new(), 25_00), 2);

        let service = TestServices {
            orders: orders_returning(order),
            ..TestServices::default()
        }
        .service(Router::with_path("orders/{order}").get(handler));

        let mut res = TestClient::get(format!("http://example.com/orders/{uuid}"))
            .send(&service)
            .await;

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.uuid, uuid.into_uuid());
        assert_eq!(body.status, "paid");
        assert_eq!(body.total_amount, 50_00);

        Ok(())
    }

    #[tokio::test]
    async fn test_other_users_order_returns_404() -> TestResult {
        let uuid = OrderUuid::new();
        let order = OrderRecord {
            user_uuid: UserUuid::new(),
            ..make_order(uuid, &make_product(ProductUuid::new(), 25_00), 1)
        };

        let service = TestServices {
            orders: orders_returning(order),
            ..TestServices::default()
        }
        .service(Router::with_path("orders/{order}").get(handler));

        let res = TestClient::get(format!("http://example.com/orders/{uuid}"))
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn test_admin_can_read_any_order() -> TestResult {
        let uuid = OrderUuid::new();
        let order = OrderRecord {
            user_uuid: UserUuid::new(),
            ..make_order(uuid, &make_product(ProductUuid::new(), 25_00), 1)
        };

        let service = TestServices {
            orders: orders_returning(order),
            ..TestServices::default()
        }
        .admin_service(Router::with_path("orders/{order}").get(handler));

        let res = TestClient::get(format!("http://example.com/orders/{uuid}"))
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }
}

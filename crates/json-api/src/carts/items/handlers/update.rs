//! Set Cart Item Quantity Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::cart_store::ServerCartStore;

use crate::{
    carts::{errors::into_status_error, handlers::cart_json, models::CartResponse},
    extensions::*,
    state::State,
};

/// Set Cart Item Quantity Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SetQuantityRequest {
    /// New absolute quantity; zero or less removes the item
    pub quantity: i64,
}

/// Set Cart Item Quantity Handler
#[endpoint(
    tags("cart"),
    summary = "Set Cart Item Quantity",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Quantity updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Product is not in the cart"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.items.update",
    skip(product, json, depot),
    fields(
        user_uuid = tracing::field::Empty,
        product_uuid = tracing::field::Empty,
        quantity = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    json: JsonBody<SetQuantityRequest>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.session_or_401()?.user_uuid();
    let product = product.into_inner();
    let quantity = json.into_inner().quantity;

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));
    span.record("product_uuid", tracing::field::display(product));
    span.record("quantity", quantity);

    let mut store = ServerCartStore::new(Arc::clone(&state.app.carts), user);

    let cart = store
        .update_quantity(product.into(), quantity)
        .await
        .map_err(into_status_error)?;

    cart_json(state, cart)
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use storefront_app::domain::{
        carts::{CartsServiceError, MockCartsService, records::Cart},
        products::records::ProductUuid,
    };

    use crate::test_helpers::{TEST_USER_UUID, TestServices, make_cart, make_product};

    use super::*;

    fn make_service(carts: MockCartsService) -> Service {
        TestServices {
            carts,
            ..TestServices::default()
        }
        .service(Router::with_path("cart/items/{product}").put(handler))
    }

    #[tokio::test]
    async fn test_update_replaces_quantity() -> TestResult {
        let lamp = make_product(ProductUuid::new(), 19_99);
        let uuid = lamp.uuid;
        let cart = make_cart(&[(lamp, 4)]);

        let mut carts = MockCartsService::new();

        carts
            .expect_set_quantity()
            .once()
            .withf(move |user, product, quantity| {
                *user == TEST_USER_UUID && *product == uuid && *quantity == 4
            })
            .return_once(move |_, _, _| Ok(cart));

        let mut res = TestClient::put(format!("http://example.com/cart/items/{uuid}"))
            .json(&json!({ "quantity": 4 }))
            .send(&make_service(carts))
            .await;

        let body: CartResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.item_count, 4);

        Ok(())
    }

    #[tokio::test]
    async fn test_negative_quantity_is_forwarded_for_removal() -> TestResult {
        let uuid = ProductUuid::new();

        let mut carts = MockCartsService::new();

        carts
            .expect_set_quantity()
            .once()
            .withf(|_, _, quantity| *quantity == -3)
            .return_once(|user, _, _| Ok(Cart::empty(user)));

        let mut res = TestClient::put(format!("http://example.com/cart/items/{uuid}"))
            .json(&json!({ "quantity": -3 }))
            .send(&make_service(carts))
            .await;

        let body: CartResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.items.is_empty(), "item should be removed");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_absent_item_returns_404() -> TestResult {
        let uuid = ProductUuid::new();

        let mut carts = MockCartsService::new();

        carts
            .expect_set_quantity()
            .once()
            .return_once(|_, _, _| Err(CartsServiceError::NotFound));

        let res = TestClient::put(format!("http://example.com/cart/items/{uuid}"))
            .json(&json!({ "quantity": 2 }))
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}

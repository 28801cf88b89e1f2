//! Create Payment Intent Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};

use storefront_app::checkout::CheckoutRequest;

use crate::{
    checkout::{
        handlers::track,
        models::{CheckoutRequestBody, PendingPaymentResponse},
    },
    extensions::*,
    state::State,
};

/// Create Payment Intent Handler
///
/// Validates the checkout form and opens a payment intent for the current
/// cart total.
#[endpoint(
    tags("checkout"),
    summary = "Create Payment Intent",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Payment intent created"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Required fields missing"),
        (status_code = StatusCode::CONFLICT, description = "Cart is empty or checkout already running"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Payment provider rejected the request"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Payment provider unreachable"),
    ),
)]
#[tracing::instrument(
    name = "checkout.intents.create",
    skip(json, depot, res),
    fields(
        user_uuid = tracing::field::Empty,
        payment_intent_id = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CheckoutRequestBody>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<PendingPaymentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.session_or_401()?.user_uuid();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));

    let request = CheckoutRequest::from(json.into_inner());
    let checkout = &state.app.checkout;

    let validated = track("validate", checkout.validate(user, &request).await)?;
    let pending = track("create_intent", checkout.create_intent(&validated).await)?;

    span.record("payment_intent_id", pending.payment_intent_id.as_str());

    res.status_code(StatusCode::CREATED);

    Ok(Json(pending.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use storefront_app::{
        domain::{carts::MockCartsService, products::records::ProductUuid},
        payments::{MockPaymentProcessor, PaymentIntentStatus, USER_METADATA_KEY},
    };

    use crate::test_helpers::{
        TEST_USER_UUID, TestServices, make_cart, make_intent, make_product,
    };

    use super::*;

    fn body() -> serde_json::Value {
        json!({
            "shipping": {
                "type": "manual",
                "address": {
                    "full_name": "Ada Lovelace",
                    "line1": "12 St James's Square",
                    "city": "London",
                    "postal_code": "SW1Y 4JH",
                    "country": "GB",
                },
            },
            "payment_method": { "type": "wallet" },
        })
    }

    #[tokio::test]
    async fn test_intent_is_created_for_cart_total() -> TestResult {
        let lamp = make_product(ProductUuid::new(), 25_00);

        let mut carts = MockCartsService::new();
        let mut payments = MockPaymentProcessor::new();

        carts
            .expect_get_cart()
            .once()
            .withf(|user| *user == TEST_USER_UUID)
            .return_once(move |_| Ok(make_cart(&[(lamp, 2)])));

        payments
            .expect_create_intent()
            .once()
            .withf(|new| {
                new.amount == 50_00
                    && new.currency == "usd"
                    && new.metadata.get(USER_METADATA_KEY) == Some(&TEST_USER_UUID.to_string())
            })
            .return_once(|new| {
                Ok(make_intent(
                    new.amount,
                    PaymentIntentStatus::RequiresPaymentMethod,
                ))
            });

        let service = TestServices {
            carts,
            payments,
            ..TestServices::default()
        }
        .service(Router::with_path("checkout/payment-intents").post(handler));

        let mut res = TestClient::post("http://example.com/checkout/payment-intents")
            .json(&body())
            .send(&service)
            .await;

        let pending: PendingPaymentResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(pending.payment_intent_id, "pi_test");
        assert_eq!(pending.amount, 50_00);
        assert_eq!(pending.status, "requires_payment_method");
        assert_eq!(pending.client_secret.as_deref(), Some("pi_test_secret"));

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_cart_returns_409_without_contacting_processor() -> TestResult {
        let mut carts = MockCartsService::new();
        let mut payments = MockPaymentProcessor::new();

        carts
            .expect_get_cart()
            .once()
            .return_once(|_| Ok(make_cart(&[])));

        payments.expect_create_intent().never();

        let service = TestServices {
            carts,
            payments,
            ..TestServices::default()
        }
        .service(Router::with_path("checkout/payment-intents").post(handler));

        let res = TestClient::post("http://example.com/checkout/payment-intents")
            .json(&body())
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}

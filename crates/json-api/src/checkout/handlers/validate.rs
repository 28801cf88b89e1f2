//! Validate Checkout Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};

use storefront_app::checkout::CheckoutRequest;

use crate::{
    checkout::{
        handlers::track,
        models::{CheckoutRequestBody, ValidatedCheckoutResponse},
    },
    extensions::*,
    state::State,
};

/// Validate Checkout Handler
///
/// Resolves shipping and billing addresses and checks the payment form
/// without contacting the payment processor.
#[endpoint(
    tags("checkout"),
    summary = "Validate Checkout",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Checkout details are complete"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Required fields missing"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "checkout.validate",
    skip(json, depot),
    fields(user_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CheckoutRequestBody>,
    depot: &mut Depot,
) -> Result<Json<ValidatedCheckoutResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.session_or_401()?.user_uuid();

    tracing::Span::current().record("user_uuid", tracing::field::display(user));

    let request = CheckoutRequest::from(json.into_inner());

    let validated = track("validate", state.app.checkout.validate(user, &request).await)?;

    Ok(Json(validated.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use storefront_app::domain::addresses::MockAddressesService;

    use crate::test_helpers::{TEST_USER_UUID, TestServices};

    use super::*;

    fn manual_address(city: &str) -> serde_json::Value {
        json!({
            "full_name": "Ada Lovelace",
            "line1": "12 St James's Square",
            "city": city,
            "postal_code": "SW1Y 4JH",
            "country": "GB",
        })
    }

    #[tokio::test]
    async fn test_manual_address_is_echoed_for_shipping_and_billing() -> TestResult {
        let service = TestServices::default()
            .service(Router::with_path("checkout/validate").post(handler));

        let mut res = TestClient::post("http://example.com/checkout/validate")
            .json(&json!({
                "shipping": { "type": "manual", "address": manual_address("London") },
                "payment_method": { "type": "wallet" },
            }))
            .send(&service)
            .await;

        let body: ValidatedCheckoutResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.shipping_address.city, "London");
        assert_eq!(body.billing_address, body.shipping_address);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_fields_return_422() -> TestResult {
        let service = TestServices::default()
            .service(Router::with_path("checkout/validate").post(handler));

        let res = TestClient::post("http://example.com/checkout/validate")
            .json(&json!({
                "shipping": { "type": "manual", "address": manual_address("") },
                "payment_method": { "type": "card", "holder_name": "Ada Lovelace" },
            }))
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn test_default_shipping_without_saved_address_returns_422() -> TestResult {
        let mut addresses = MockAddressesService::new();

        addresses
            .expect_list_addresses()
            .once()
            .withf(|user| *user == TEST_USER_UUID)
            .return_once(|_| Ok(Vec::new()));

        let service = TestServices {
            addresses,
            ..TestServices::default()
        }
        .service(Router::with_path("checkout/validate").post(handler));

        let res = TestClient::post("http://example.com/checkout/validate")
            .json(&json!({ "payment_method": { "type": "wallet" } }))
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }
}

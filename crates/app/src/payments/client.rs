//! HTTP client for a Stripe-compatible payment intents API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use crate::payments::{
    NewPaymentIntent, PaymentIntent, PaymentProcessor, PaymentProcessorError,
};

/// Configuration for connecting to the payment processor.
#[derive(Clone)]
pub struct PaymentsConfig {
    /// API base, e.g. `"https://api.stripe.com"`.
    pub api_base: String,

    /// Secret API key.
    pub secret_key: String,
}

impl std::fmt::Debug for PaymentsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentsConfig")
            .field("api_base", &self.api_base)
            .field("secret_key", &"**redacted**")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    config: PaymentsConfig,
    http: Client,
}

impl StripeClient {
    #[must_use]
    pub fn new(config: PaymentsConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v1/payment_intents{path}",
            self.config.api_base.trim_end_matches('/')
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<PaymentIntent, PaymentProcessorError> {
        let response = request
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(PaymentProcessorError::Transport)?;

        read_intent(response).await
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_intent(
        &self,
        intent: NewPaymentIntent,
    ) -> Result<PaymentIntent, PaymentProcessorError> {
        debug!(amount = intent.amount, currency = %intent.currency, "creating payment intent");

        let request = self
            .http
            .post(self.url(""))
            .header("Idempotency-Key", &intent.idempotency_key)
            .form(&create_intent_form(&intent));

        self.send(request).await
    }

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentProcessorError> {
        let request = self.http.get(self.url(&format!("/{id}")));

        self.send(request).await
    }

    async fn confirm_intent(
        &self,
        id: &str,
        payment_method: &str,
    ) -> Result<PaymentIntent, PaymentProcessorError> {
        let request = self
            .http
            .post(self.url(&format!("/{id}/confirm")))
            .form(&[("payment_method", payment_method)]);

        self.send(request).await
    }
}

/// Form-encoded body for intent creation, metadata flattened as `metadata[key]`.
fn create_intent_form(intent: &NewPaymentIntent) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), intent.amount.to_string()),
        ("currency".to_string(), intent.currency.clone()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
    ];

    form.extend(
        intent
            .metadata
            .iter()
            .map(|(key, value)| (format!("metadata[{key}]"), value.clone())),
    );

    form
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

fn rejection_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error.message)
}

async fn read_intent(response: Response) -> Result<PaymentIntent, PaymentProcessorError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();

        return Err(PaymentProcessorError::Rejected {
            status: status.as_u16(),
            message: rejection_message(&body).unwrap_or_else(|| status.to_string()),
        });
    }

    response
        .json::<PaymentIntent>()
        .await
        .map_err(PaymentProcessorError::Decode)
}

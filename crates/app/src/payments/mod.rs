//! Payment processing

mod client;
mod errors;
mod models;

pub use client::*;
pub use errors::*;
pub use models::*;

use async_trait::async_trait;
use mockall::automock;

/// An external payment processor that tracks charges as payment intents.
#[automock]
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create an intent for `amount` minor units.
    async fn create_intent(
        &self,
        intent: NewPaymentIntent,
    ) -> Result<PaymentIntent, PaymentProcessorError>;

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentProcessorError>;

    /// Confirm an intent with the given payment method.
    async fn confirm_intent(
        &self,
        id: &str,
        payment_method: &str,
    ) -> Result<PaymentIntent, PaymentProcessorError>;
}

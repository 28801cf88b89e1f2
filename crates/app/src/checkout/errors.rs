//! Checkout errors.

use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    domain::{addresses::AddressesServiceError, carts::CartsServiceError},
    payments::{PaymentIntentStatus, PaymentProcessorError},
    pricing::PricingError,
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Required checkout fields are missing; nothing was charged.
    #[error("missing required checkout fields: {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("cart is empty")]
    EmptyCart,

    #[error("payment provider rejected the request")]
    PaymentProvider(#[source] PaymentProcessorError),

    #[error("payment provider is unreachable")]
    Network(#[source] PaymentProcessorError),

    #[error("payment not completed (status: {status})")]
    PaymentNotCompleted { status: PaymentIntentStatus },

    /// The cart changed after the intent was created; nothing was charged.
    #[error("payment intent {payment_intent_id} no longer matches the cart")]
    AmountMismatch {
        payment_intent_id: String,
        #[source]
        source: CartTotalChanged,
    },

    /// Payment was captured but the order could not be written; needs manual
    /// reconciliation against `payment_intent_id`.
    #[error("failed to persist order for payment intent {payment_intent_id}")]
    OrderPersistence {
        payment_intent_id: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// An order already exists for this payment intent.
    #[error("payment intent {payment_intent_id} already fulfilled")]
    AlreadyFulfilled { payment_intent_id: String },

    #[error("a checkout is already in progress for this user")]
    CheckoutInProgress,

    #[error("payment intent belongs to another user")]
    ForeignPaymentIntent,

    #[error("checkout cancelled")]
    Cancelled,

    #[error("failed to read cart")]
    Cart(#[source] CartsServiceError),

    #[error("failed to read saved addresses")]
    Addresses(#[source] AddressesServiceError),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl CheckoutError {
    /// Stable machine-readable code, also used as the metrics outcome label.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::EmptyCart => "empty_cart",
            Self::PaymentProvider(_) => "payment_provider",
            Self::Network(_) => "network",
            Self::PaymentNotCompleted { .. } => "payment_not_completed",
            Self::AmountMismatch { .. } => "amount_mismatch",
            Self::OrderPersistence { .. } => "order_persistence",
            Self::AlreadyFulfilled { .. } => "already_fulfilled",
            Self::CheckoutInProgress => "checkout_in_progress",
            Self::ForeignPaymentIntent => "foreign_payment_intent",
            Self::Cancelled => "cancelled",
            Self::Cart(_) => "cart",
            Self::Addresses(_) => "addresses",
            Self::Pricing(_) => "pricing",
        }
    }
}

/// Server cart total differs from the amount on the payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cart total {cart_total} differs from payment intent amount {intent_amount}")]
pub struct CartTotalChanged {
    pub intent_amount: u64,
    pub cart_total: u64,
}

impl From<PaymentProcessorError> for CheckoutError {
    fn from(error: PaymentProcessorError) -> Self {
        if error.is_transport() {
            Self::Network(error)
        } else {
            Self::PaymentProvider(error)
        }
    }
}

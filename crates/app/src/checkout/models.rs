//! Checkout requests, step outputs and results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    checkout::CheckoutError,
    domain::{
        addresses::{data::Address, records::AddressUuid},
        orders::records::OrderUuid,
        users::records::UserUuid,
    },
    payments::{PaymentIntent, PaymentIntentStatus},
};

/// Checkout progress. `Failed` is reachable from every other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    Idle,
    AddressValidated,
    IntentCreated,
    PaymentConfirmed,
    OrderPersisted,
    CartCleared,
    Done,
    Failed,
}

impl CheckoutState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AddressValidated => "address_validated",
            Self::IntentCreated => "intent_created",
            Self::PaymentConfirmed => "payment_confirmed",
            Self::OrderPersisted => "order_persisted",
            Self::CartCleared => "cart_cleared",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Whether payment has been captured, after which checkout runs to
    /// completion regardless of cancellation.
    #[must_use]
    pub const fn is_past_capture(self) -> bool {
        matches!(
            self,
            Self::PaymentConfirmed | Self::OrderPersisted | Self::CartCleared | Self::Done
        )
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where to ship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShippingSelection {
    Saved { address_uuid: AddressUuid },
    Manual { address: Address },

    /// The user's most recently saved address.
    #[default]
    Default,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BillingSelection {
    #[default]
    SameAsShipping,
    Saved { address_uuid: AddressUuid },
    Manual { address: Address },
}

/// Card details entered at checkout. Only their presence is checked; they are
/// never sent to the payment processor or logged.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    #[serde(default)]
    pub holder_name: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub cvc: String,
}

impl CardDetails {
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("holder_name", &self.holder_name),
            ("number", &self.number),
            ("expiry", &self.expiry),
            ("cvc", &self.cvc),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("holder_name", &self.holder_name)
            .field("number", &"[redacted]")
            .field("expiry", &"[redacted]")
            .field("cvc", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethodChoice {
    Card(CardDetails),
    Wallet,
}

/// Everything the user chose on the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub shipping: ShippingSelection,
    #[serde(default)]
    pub billing: BillingSelection,
    pub payment_method: PaymentMethodChoice,
}

/// Output of address validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedCheckout {
    pub user: UserUuid,
    pub shipping_address: Address,
    pub billing_address: Address,
}

/// A payment intent awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingPayment {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
    pub amount: u64,
    pub currency: String,
    pub status: PaymentIntentStatus,
}

impl From<PaymentIntent> for PendingPayment {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            amount: intent.amount,
            currency: intent.currency,
            status: intent.status,
        }
    }
}

/// Proof of a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub order_uuid: OrderUuid,
    pub payment_intent_id: String,

    /// Minor units.
    pub amount: u64,

    pub currency: String,
    pub payment_status: PaymentIntentStatus,
    pub shipping_address: Address,
}

#[derive(Debug)]
pub struct CheckoutFailure {
    /// The last state reached before the failing step.
    pub last_state: CheckoutState,
    pub error: CheckoutError,
}

#[derive(Debug)]
pub enum CheckoutResult {
    Validated(ValidatedCheckout),
    IntentCreated(PendingPayment),
    Receipt(Receipt),
    Failed(CheckoutFailure),
}

impl CheckoutResult {
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        match self {
            Self::Validated(_) => CheckoutState::AddressValidated,
            Self::IntentCreated(_) => CheckoutState::IntentCreated,
            Self::Receipt(_) => CheckoutState::Done,
            Self::Failed(_) => CheckoutState::Failed,
        }
    }

    /// Metrics label for this result.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Failed(failure) => failure.error.code(),
            _ => "success",
        }
    }
}

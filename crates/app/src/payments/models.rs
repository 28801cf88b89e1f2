//! Payment intent models.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Metadata key recording which user a checkout intent belongs to.
pub const USER_METADATA_KEY: &str = "user_uuid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

impl PaymentIntentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresAction => "requires_action",
            Self::Processing => "processing",
            Self::RequiresCapture => "requires_capture",
            Self::Canceled => "canceled",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }

    /// The intent is still waiting for a payment method to be attached or confirmed.
    #[must_use]
    pub const fn awaits_payment_method(self) -> bool {
        matches!(self, Self::RequiresPaymentMethod | Self::RequiresConfirmation)
    }
}

impl fmt::Display for PaymentIntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request for a new payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentIntent {
    /// Minor units.
    pub amount: u64,

    /// Lower-case ISO 4217 code.
    pub currency: String,

    pub metadata: BTreeMap<String, String>,

    /// Replaying a request with the same key returns the original intent.
    pub idempotency_key: String,
}

/// A payment intent as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    pub status: PaymentIntentStatus,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl PaymentIntent {
    /// Whether the intent was created for the given user.
    #[must_use]
    pub fn belongs_to(&self, user: &str) -> bool {
        self.metadata
            .get(USER_METADATA_KEY)
            .is_some_and(|owner| owner == user)
    }
}

//! Checkout Payloads

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::checkout::{
    BillingSelection, CardDetails, CheckoutRequest, PaymentMethodChoice, PendingPayment, Receipt,
    ShippingSelection, ValidatedCheckout,
};

use crate::addresses::models::AddressPayload;

/// Where to ship the order.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ShippingChoice {
    /// A previously saved address
    Saved { address_uuid: Uuid },

    /// An address typed in at checkout
    Manual { address: AddressPayload },

    /// The most recently saved address
    #[default]
    Default,
}

impl From<ShippingChoice> for ShippingSelection {
    fn from(choice: ShippingChoice) -> Self {
        match choice {
            ShippingChoice::Saved { address_uuid } => Self::Saved {
                address_uuid: address_uuid.into(),
            },
            ShippingChoice::Manual { address } => Self::Manual {
                address: address.into(),
            },
            ShippingChoice::Default => Self::Default,
        }
    }
}

/// Where to send the bill.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum BillingChoice {
    #[default]
    SameAsShipping,
    Saved {
        address_uuid: Uuid,
    },
    Manual {
        address: AddressPayload,
    },
}

impl From<BillingChoice> for BillingSelection {
    fn from(choice: BillingChoice) -> Self {
        match choice {
            BillingChoice::SameAsShipping => Self::SameAsShipping,
            BillingChoice::Saved { address_uuid } => Self::Saved {
                address_uuid: address_uuid.into(),
            },
            BillingChoice::Manual { address } => Self::Manual {
                address: address.into(),
            },
        }
    }
}

/// How the user pays. Card details are checked for presence only.
#[derive(Clone, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum PaymentMethodPayload {
    Card {
        #[serde(default)]
        holder_name: String,
        #[serde(default)]
        number: String,
        #[serde(default)]
        expiry: String,
        #[serde(default)]
        cvc: String,
    },
    Wallet,
}

impl std::fmt::Debug for PaymentMethodPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card { .. } => f.write_str("Card([redacted])"),
            Self::Wallet => f.write_str("Wallet"),
        }
    }
}

impl From<PaymentMethodPayload> for PaymentMethodChoice {
    fn from(payload: PaymentMethodPayload) -> Self {
        match payload {
            PaymentMethodPayload::Card {
                holder_name,
                number,
                expiry,
                cvc,
            } => Self::Card(CardDetails {
                holder_name,
                number,
                expiry,
                cvc,
            }),
            PaymentMethodPayload::Wallet => Self::Wallet,
        }
    }
}

/// Checkout form submission.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub(crate) struct CheckoutRequestBody {
    #[serde(default)]
    pub shipping: ShippingChoice,

    #[serde(default)]
    pub billing: BillingChoice,

    pub payment_method: PaymentMethodPayload,
}

impl From<CheckoutRequestBody> for CheckoutRequest {
    fn from(body: CheckoutRequestBody) -> Self {
        Self {
            shipping: body.shipping.into(),
            billing: body.billing.into(),
            payment_method: body.payment_method.into(),
        }
    }
}

/// Resolved checkout addresses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ValidatedCheckoutResponse {
    pub shipping_address: AddressPayload,
    pub billing_address: AddressPayload,
}

impl From<ValidatedCheckout> for ValidatedCheckoutResponse {
    fn from(checkout: ValidatedCheckout) -> Self {
        Self {
            shipping_address: checkout.shipping_address.into(),
            billing_address: checkout.billing_address.into(),
        }
    }
}

/// A payment intent awaiting confirmation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PendingPaymentResponse {
    pub payment_intent_id: String,

    /// Passed to the client to collect payment details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Minor units
    pub amount: u64,

    pub currency: String,

    pub status: String,
}

impl From<PendingPayment> for PendingPaymentResponse {
    fn from(pending: PendingPayment) -> Self {
        Self {
            payment_intent_id: pending.payment_intent_id,
            client_secret: pending.client_secret,
            amount: pending.amount,
            currency: pending.currency,
            status: pending.status.as_str().to_string(),
        }
    }
}

/// Checkout receipt.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ReceiptResponse {
    pub order_uuid: Uuid,

    pub payment_intent_id: String,

    /// Minor units
    pub amount: u64,

    pub currency: String,

    pub payment_status: String,

    pub shipping_address: AddressPayload,
}

impl From<Receipt> for ReceiptResponse {
    fn from(receipt: Receipt) -> Self {
        Self {
            order_uuid: receipt.order_uuid.into(),
            payment_intent_id: receipt.payment_intent_id,
            amount: receipt.amount,
            currency: receipt.currency,
            payment_status: receipt.payment_status.as_str().to_string(),
            shipping_address: receipt.shipping_address.into(),
        }
    }
}

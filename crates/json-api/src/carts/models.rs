//! Cart Requests & Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::{
    cart_store::{GuestCartItem, MergeFailure, PricedGuestCart},
    domain::carts::records::Cart,
    pricing::{PricingError, format_amount, resolve_currency},
};

/// One priced line of the authoritative cart.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartLineResponse {
    /// Cart item UUID
    pub uuid: Uuid,

    pub product_uuid: Uuid,

    /// Current product name
    pub name: String,

    pub images: Vec<String>,

    pub quantity: u32,

    /// Live sell price in minor units
    pub unit_price: u64,

    /// `unit_price * quantity` in minor units
    pub line_total: u64,
}

/// The user's cart as stored on the server.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    pub items: Vec<CartLineResponse>,

    /// Sum of quantities
    pub item_count: u64,

    /// Grand total in minor units
    pub total: u64,

    /// Lower-case ISO 4217 code
    pub currency: String,

    /// Human readable total, e.g. `$50.00`
    pub formatted_total: String,
}

impl CartResponse {
    /// Price a cart at current product prices.
    pub(crate) fn new(cart: &Cart, currency: &str) -> Result<Self, PricingError> {
        let totals = cart.totals()?;
        let formatted_total = format_amount(totals.total, resolve_currency(currency)?);

        let items = cart
            .lines
            .iter()
            .zip(totals.lines)
            .map(|(line, priced)| CartLineResponse {
                uuid: line.item.uuid.into(),
                product_uuid: line.item.product_uuid.into(),
                name: line.product.name.clone(),
                images: line.product.images.clone(),
                quantity: line.item.quantity,
                unit_price: priced.unit_price,
                line_total: priced.line_total,
            })
            .collect();

        Ok(Self {
            items,
            item_count: cart.item_count(),
            total: totals.total,
            currency: currency.to_string(),
            formatted_total,
        })
    }
}

/// A product and quantity from a guest cart snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub(crate) struct GuestItemRequest {
    pub product_uuid: Uuid,
    pub quantity: u32,
}

impl From<GuestItemRequest> for GuestCartItem {
    fn from(item: GuestItemRequest) -> Self {
        Self {
            product_uuid: item.product_uuid.into(),
            quantity: item.quantity,
        }
    }
}

impl From<GuestCartItem> for GuestItemRequest {
    fn from(item: GuestCartItem) -> Self {
        Self {
            product_uuid: item.product_uuid.into(),
            quantity: item.quantity,
        }
    }
}

/// A guest cart snapshot, as held in client storage.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct GuestCartRequest {
    pub items: Vec<GuestItemRequest>,
}

/// Add a product to a guest cart snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct GuestAddItemRequest {
    /// Current snapshot from client storage
    #[serde(default)]
    pub items: Vec<GuestItemRequest>,

    pub product_uuid: Uuid,

    pub quantity: u32,
}

/// The snapshot the client should write back under `guest_cart`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct GuestSnapshotResponse {
    pub items: Vec<GuestItemRequest>,
}

/// A guest entry the server refused during a merge.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MergeFailureResponse {
    pub product_uuid: Uuid,
    pub quantity: u32,
    pub reason: String,

    /// Worth retrying later; the product itself was not refused
    pub retryable: bool,
}

impl From<MergeFailure> for MergeFailureResponse {
    fn from(failure: MergeFailure) -> Self {
        Self {
            product_uuid: failure.product_uuid.into(),
            quantity: failure.quantity,
            reason: failure.reason,
            retryable: failure.retryable,
        }
    }
}

/// Merge result. The client drops its guest snapshot unless the merge was
/// deferred.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MergeCartResponse {
    /// `merged`, `skipped` or `deferred`
    pub status: String,

    /// Whether the client should delete its `guest_cart` snapshot
    pub discard_guest_cart: bool,

    pub merged: Vec<GuestItemRequest>,

    pub failed: Vec<MergeFailureResponse>,

    /// The authoritative cart after the merge
    pub cart: CartResponse,
}

/// One priced guest line.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct GuestLineResponse {
    pub product_uuid: Uuid,
    pub quantity: u32,
    pub unit_price: u64,
    pub line_total: u64,
}

/// A guest cart priced against the live catalog.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct GuestTotalsResponse {
    pub items: Vec<GuestLineResponse>,

    /// Grand total in minor units
    pub total: u64,

    pub currency: String,

    pub formatted_total: String,

    /// Products that no longer exist; left out of the total
    pub unavailable: Vec<Uuid>,
}

impl GuestTotalsResponse {
    pub(crate) fn new(priced: PricedGuestCart, currency: &str) -> Result<Self, PricingError> {
        let formatted_total = format_amount(priced.totals.total, resolve_currency(currency)?);

        Ok(Self {
            items: priced
                .totals
                .lines
                .into_iter()
                .map(|line| GuestLineResponse {
                    product_uuid: line.product_uuid.into(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.line_total,
                })
                .collect(),
            total: priced.totals.total,
            currency: currency.to_string(),
            formatted_total,
            unavailable: priced.unavailable.into_iter().map(Into::into).collect(),
        })
    }
}

//! Order Payloads

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::orders::records::{OrderItemRecord, OrderRecord};

use crate::addresses::models::AddressPayload;

/// A purchased product, priced as it was when the order was placed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemResponse {
    pub uuid: Uuid,
    pub product_uuid: Uuid,
    pub quantity: u32,

    /// Unit price in minor units
    pub price: u64,

    pub product_name: String,
    pub product_images: Vec<String>,
}

impl From<OrderItemRecord> for OrderItemResponse {
    fn from(item: OrderItemRecord) -> Self {
        Self {
            uuid: item.uuid.into(),
            product_uuid: item.product_uuid.into(),
            quantity: item.quantity,
            price: item.price,
            product_name: item.product_name,
            product_images: item.product_images,
        }
    }
}

/// Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    pub uuid: Uuid,

    /// Minor units
    pub total_amount: u64,

    pub currency: String,

    /// One of `pending`, `paid`, `shipped`, `delivered`, `cancelled`, `refunded`
    pub status: String,

    pub payment_intent_id: String,

    pub shipping_address: AddressPayload,
    pub billing_address: AddressPayload,

    pub items: Vec<OrderItemResponse>,

    pub created_at: String,
    pub updated_at: String,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            uuid: order.uuid.into(),
            total_amount: order.total_amount,
            currency: order.currency,
            status: order.status.as_str().to_string(),
            payment_intent_id: order.payment_intent_id,
            shipping_address: order.shipping_address.into(),
            billing_address: order.billing_address.into(),
            items: order.items.into_iter().map(Into::into).collect(),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
        }
    }
}

/// Order Status Update Request
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct UpdateOrderStatusRequest {
    /// One of `pending`, `paid`, `shipped`, `delivered`, `cancelled`, `refunded`
    pub status: String,
}

//! Order Data

use jiff::Timestamp;

use crate::domain::{
    addresses::data::Address,
    orders::records::{OrderItemUuid, OrderStatus, OrderUuid},
    products::records::ProductUuid,
    users::records::UserUuid,
};

/// New Order Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,
    pub total_amount: u64,
    pub currency: String,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub status: OrderStatus,
    pub payment_intent_id: String,
    pub items: Vec<NewOrderItem>,
}

/// New Order Item Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub uuid: OrderItemUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub price: u64,
}

/// Confirmation of a persisted order, echoing what was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrder {
    pub uuid: OrderUuid,
    pub created_at: Timestamp,
    pub order: NewOrder,
}

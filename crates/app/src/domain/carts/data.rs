//! Cart Data

use crate::domain::{carts::records::CartItemUuid, products::records::ProductUuid};

/// New Cart Item Data
///
/// Adding a product that is already in the cart adds `quantity` to the
/// existing entry; the new `uuid` is then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
}

impl NewCartItem {
    #[must_use]
    pub fn new(product_uuid: ProductUuid, quantity: u32) -> Self {
        Self {
            uuid: CartItemUuid::new(),
            product_uuid,
            quantity,
        }
    }
}

//! Cart Records

use jiff::Timestamp;

use crate::{
    domain::{
        products::records::{ProductRecord, ProductUuid},
        users::records::UserUuid,
    },
    pricing::{CartTotals, PricingError, price_lines},
    uuids::TypedUuid,
};

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItemRecord>;

/// Cart Item Record; one per (user, product).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemRecord {
    pub uuid: CartItemUuid,
    pub user_uuid: UserUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A cart item joined with the live product it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item: CartItemRecord,
    pub product: ProductRecord,
}

/// A user's server-side cart, as read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub user_uuid: UserUuid,
    pub lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn empty(user_uuid: UserUuid) -> Self {
        Self {
            user_uuid,
            lines: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity held for a product, if it is in the cart.
    #[must_use]
    pub fn quantity_of(&self, product: ProductUuid) -> Option<u32> {
        self.lines
            .iter()
            .find(|line| line.item.product_uuid == product)
            .map(|line| line.item.quantity)
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.item.quantity))
            .sum()
    }

    /// Price every line at its product's current `sell_price`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if a line or the total overflows.
    pub fn totals(&self) -> Result<CartTotals, PricingError> {
        price_lines(
            self.lines
                .iter()
                .map(|line| (&line.product, line.item.quantity)),
        )
    }
}

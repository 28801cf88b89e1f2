//! Guest carts persisted in client-side storage.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    cart_store::GuestCartError,
    domain::products::{
        ProductsService, ProductsServiceError,
        records::{ProductRecord, ProductUuid},
    },
    pricing::{CartTotals, price_lines},
};

/// Storage key holding the guest cart snapshot.
pub const GUEST_CART_KEY: &str = "guest_cart";

/// String key/value storage owned by the client, e.g. browser local storage.
pub trait GuestStorage {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String);

    fn remove(&mut self, key: &str);
}

impl<T: GuestStorage + ?Sized> GuestStorage for &mut T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) {
        (**self).set(key, value);
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryGuestStorage {
    entries: HashMap<String, String>,
}

impl InMemoryGuestStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GuestStorage for InMemoryGuestStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// One guest cart entry. Guest entries never carry prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCartItem {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
}

/// A guest cart priced against the live catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricedGuestCart {
    pub totals: CartTotals,

    /// Entries whose product no longer exists; excluded from the totals.
    pub unavailable: Vec<ProductUuid>,
}

/// A cart for an unauthenticated visitor. Every mutation writes the full
/// snapshot back to storage before returning.
#[derive(Debug)]
pub struct GuestCart<S> {
    storage: S,
    items: Vec<GuestCartItem>,
}

impl<S: GuestStorage> GuestCart<S> {
    /// Load the snapshot from storage. A missing or unreadable snapshot is an
    /// empty cart.
    pub fn load(storage: S) -> Self {
        let items = match storage.get(GUEST_CART_KEY) {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<GuestCartItem>>(&raw) {
                Ok(items) => normalize(items),
                Err(error) => {
                    warn!(%error, "discarding unreadable guest cart snapshot");
                    Vec::new()
                }
            },
        };

        Self { storage, items }
    }

    /// Start from an explicit snapshot, writing it to storage.
    ///
    /// # Errors
    ///
    /// Returns [`GuestCartError::Encode`] if the snapshot cannot be written.
    pub fn from_items(storage: S, items: Vec<GuestCartItem>) -> Result<Self, GuestCartError> {
        let mut cart = Self {
            storage,
            items: normalize(items),
        };

        cart.persist()?;

        Ok(cart)
    }

    #[must_use]
    pub fn items(&self) -> &[GuestCartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn quantity_of(&self, product: ProductUuid) -> Option<u32> {
        self.items
            .iter()
            .find(|item| item.product_uuid == product)
            .map(|item| item.quantity)
    }

    /// Add `quantity` of a product, summing with any existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`GuestCartError::InvalidQuantity`] for a zero quantity or one
    /// that would overflow, and [`GuestCartError::MissingProduct`] for a nil id.
    pub fn add_item(&mut self, product: ProductUuid, quantity: u32) -> Result<(), GuestCartError> {
        if product.is_nil() {
            return Err(GuestCartError::MissingProduct);
        }

        if quantity == 0 {
            return Err(GuestCartError::InvalidQuantity);
        }

        match self.entry_mut(product) {
            Some(entry) => {
                entry.quantity = entry
                    .quantity
                    .checked_add(quantity)
                    .ok_or(GuestCartError::InvalidQuantity)?;
            }
            None => self.items.push(GuestCartItem {
                product_uuid: product,
                quantity,
            }),
        }

        self.persist()
    }

    /// [`Self::add_item`] for a product that must exist in the live catalog.
    ///
    /// # Errors
    ///
    /// Returns [`GuestCartError::MissingProduct`] for an unknown or deleted
    /// product and [`GuestCartError::Catalog`] when the catalog cannot be read.
    /// The snapshot is unchanged on error.
    pub async fn add_item_checked(
        &mut self,
        catalog: &dyn ProductsService,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), GuestCartError> {
        if quantity == 0 {
            return Err(GuestCartError::InvalidQuantity);
        }

        if product.is_nil() {
            return Err(GuestCartError::MissingProduct);
        }

        match catalog.get_product(product).await {
            Ok(_) => self.add_item(product, quantity),
            Err(ProductsServiceError::NotFound) => Err(GuestCartError::MissingProduct),
            Err(error) => Err(GuestCartError::Catalog(error)),
        }
    }

    /// Set the absolute quantity of a product in the cart; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns [`GuestCartError::NotInCart`] when setting a positive quantity
    /// for a product the cart does not hold.
    pub fn update_quantity(
        &mut self,
        product: ProductUuid,
        quantity: i64,
    ) -> Result<(), GuestCartError> {
        if quantity <= 0 {
            return self.remove_item(product);
        }

        let quantity = u32::try_from(quantity).map_err(|_| GuestCartError::InvalidQuantity)?;

        self.entry_mut(product)
            .ok_or(GuestCartError::NotInCart)?
            .quantity = quantity;

        self.persist()
    }

    /// Remove a product. Removing an absent product still succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`GuestCartError::Encode`] if the snapshot cannot be written.
    pub fn remove_item(&mut self, product: ProductUuid) -> Result<(), GuestCartError> {
        self.items.retain(|item| item.product_uuid != product);

        self.persist()
    }

    /// Empty the cart, keeping an (empty) snapshot in storage.
    ///
    /// # Errors
    ///
    /// Returns [`GuestCartError::Encode`] if the snapshot cannot be written.
    pub fn clear(&mut self) -> Result<(), GuestCartError> {
        self.items.clear();

        self.persist()
    }

    /// Forget the cart entirely and delete its snapshot, as on logout or
    /// after a merge.
    pub fn discard(&mut self) {
        self.items.clear();
        self.storage.remove(GUEST_CART_KEY);
    }

    /// Price the cart from current product records.
    ///
    /// # Errors
    ///
    /// Returns [`GuestCartError::Catalog`] when the catalog fails for reasons
    /// other than a missing product, or a pricing error on overflow.
    pub async fn totals(
        &self,
        catalog: &dyn ProductsService,
    ) -> Result<PricedGuestCart, GuestCartError> {
        let mut resolved: Vec<(ProductRecord, u32)> = Vec::with_capacity(self.items.len());
        let mut unavailable = Vec::new();

        for item in &self.items {
            match catalog.get_product(item.product_uuid).await {
                Ok(product) => resolved.push((product, item.quantity)),
                Err(ProductsServiceError::NotFound) => unavailable.push(item.product_uuid),
                Err(error) => return Err(GuestCartError::Catalog(error)),
            }
        }

        let totals = price_lines(resolved.iter().map(|(product, quantity)| (product, *quantity)))?;

        Ok(PricedGuestCart {
            totals,
            unavailable,
        })
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn entry_mut(&mut self, product: ProductUuid) -> Option<&mut GuestCartItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_uuid == product)
    }

    fn persist(&mut self) -> Result<(), GuestCartError> {
        let snapshot = serde_json::to_string(&self.items).map_err(GuestCartError::Encode)?;

        self.storage.set(GUEST_CART_KEY, snapshot);

        Ok(())
    }
}

/// Fold duplicate products together and drop empty or nil entries, keeping
/// first-seen order.
fn normalize(items: Vec<GuestCartItem>) -> Vec<GuestCartItem> {
    let mut normalized: Vec<GuestCartItem> = Vec::with_capacity(items.len());

    for item in items {
        if item.quantity == 0 || item.product_uuid.is_nil() {
            continue;
        }

        match normalized
            .iter_mut()
            .find(|existing| existing.product_uuid == item.product_uuid)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => normalized.push(item),
        }
    }

    normalized
}

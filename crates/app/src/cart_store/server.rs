//! Server-backed cart view for an authenticated user.

use std::{sync::Arc, time::Duration};

use tokio::time::Instant;
use tracing::debug;

use crate::{
    cart_store::ServerCartError,
    domain::{
        carts::{CartsService, CartsServiceError, data::NewCartItem, records::Cart},
        products::records::ProductUuid,
        users::records::UserUuid,
    },
    pricing::CartTotals,
};

/// Minimum time between non-forced refreshes.
pub const DEFAULT_REFRESH_DEBOUNCE: Duration = Duration::from_secs(2);

/// Holds the last cart the server returned. The view is never edited locally;
/// each mutation replaces it with the server's response.
pub struct ServerCartStore {
    carts: Arc<dyn CartsService>,
    user: UserUuid,
    view: Option<Cart>,
    refreshed_at: Option<Instant>,
    debounce: Duration,
}

impl ServerCartStore {
    #[must_use]
    pub fn new(carts: Arc<dyn CartsService>, user: UserUuid) -> Self {
        Self {
            carts,
            user,
            view: None,
            refreshed_at: None,
            debounce: DEFAULT_REFRESH_DEBOUNCE,
        }
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    #[must_use]
    pub fn user(&self) -> UserUuid {
        self.user
    }

    /// The last server response, if any has been received.
    #[must_use]
    pub fn view(&self) -> Option<&Cart> {
        self.view.as_ref()
    }

    /// Re-read the cart from the server. Without `force`, a refresh within the
    /// debounce window returns the current view unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ServerCartError::Carts`] if the server read fails.
    pub async fn refresh(&mut self, force: bool) -> Result<&Cart, ServerCartError> {
        let fresh = self
            .refreshed_at
            .is_some_and(|at| at.elapsed() < self.debounce);

        if !force && fresh && self.view.is_some() {
            debug!(user_uuid = %self.user, "cart refresh debounced");

            return self.current();
        }

        let cart = self.carts.get_cart(self.user).await?;

        Ok(self.replace(cart))
    }

    /// # Errors
    ///
    /// Returns [`ServerCartError::Carts`] when the server rejects the change.
    pub async fn add_item(
        &mut self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<&Cart, ServerCartError> {
        let cart = self
            .carts
            .add_item(self.user, NewCartItem::new(product, quantity))
            .await?;

        Ok(self.replace(cart))
    }

    /// # Errors
    ///
    /// Returns [`ServerCartError::Carts`] when the server rejects the change.
    pub async fn update_quantity(
        &mut self,
        product: ProductUuid,
        quantity: i64,
    ) -> Result<&Cart, ServerCartError> {
        let cart = self
            .carts
            .set_quantity(self.user, product, quantity)
            .await?;

        Ok(self.replace(cart))
    }

    /// # Errors
    ///
    /// Returns [`ServerCartError::Carts`] when the server rejects the change.
    pub async fn remove_item(&mut self, product: ProductUuid) -> Result<&Cart, ServerCartError> {
        let cart = self.carts.remove_item(self.user, product).await?;

        Ok(self.replace(cart))
    }

    /// # Errors
    ///
    /// Returns [`ServerCartError::Carts`] when the server rejects the change.
    pub async fn clear(&mut self) -> Result<&Cart, ServerCartError> {
        let cart = self.carts.clear_cart(self.user).await?;

        Ok(self.replace(cart))
    }

    /// Totals of the current view, refreshing first if nothing has been read.
    ///
    /// # Errors
    ///
    /// Returns a carts error if the initial read fails, or a pricing error.
    pub async fn totals(&mut self) -> Result<CartTotals, ServerCartError> {
        if self.view.is_none() {
            self.refresh(true).await?;
        }

        Ok(self.current()?.totals()?)
    }

    fn replace(&mut self, cart: Cart) -> &Cart {
        self.refreshed_at = Some(Instant::now());
        self.view.insert(cart)
    }

    fn current(&self) -> Result<&Cart, ServerCartError> {
        self.view
            .as_ref()
            .ok_or(ServerCartError::Carts(CartsServiceError::NotFound))
    }
}

impl std::fmt::Debug for ServerCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerCartStore")
            .field("user", &self.user)
            .field("view", &self.view)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

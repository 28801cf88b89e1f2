//! Guest-to-server cart merge on login.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    auth::{AuthService, Session},
    cart_store::{
        CartMergeError, GuestCart, GuestCartItem, GuestStorage, InMemoryGuestStorage,
        ServerCartStore,
    },
    domain::{
        carts::{CartsService, records::Cart},
        products::records::ProductUuid,
        users::records::UserUuid,
    },
};

/// Client-side memory of whether this session already merged. Switching user
/// starts a fresh session.
#[derive(Debug, Clone, Default)]
pub struct MergeSession {
    has_merged: bool,
    last_user: Option<UserUuid>,
}

impl MergeSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a merge should run for `user`.
    pub fn should_merge(&mut self, user: UserUuid) -> bool {
        if self.last_user != Some(user) {
            self.last_user = Some(user);
            self.has_merged = false;
        }

        !self.has_merged
    }

    pub fn mark_merged(&mut self) {
        self.has_merged = true;
    }

    /// Allow another merge for the current user.
    pub fn unmark_merged(&mut self) {
        self.has_merged = false;
    }

    #[must_use]
    pub fn has_merged(&self) -> bool {
        self.has_merged
    }

    /// Forget the session, as on logout.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A guest entry the server refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeFailure {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub reason: String,

    /// The cart store was unavailable rather than refusing the product.
    pub retryable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// This session already merged; nothing was sent.
    Skipped,
    Merged {
        merged: Vec<GuestCartItem>,
        failed: Vec<MergeFailure>,
    },
    /// Every entry failed on a storage error; the guest cart is kept and the
    /// session may merge again.
    Deferred { failed: Vec<MergeFailure> },
}

impl MergeOutcome {
    /// Whether the client should drop its guest snapshot.
    #[must_use]
    pub fn discards_guest_cart(&self) -> bool {
        !matches!(self, Self::Deferred { .. })
    }
}

/// Pushes every guest entry to the server cart, then drops the guest cart and
/// re-reads the server cart.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartMergeCoordinator;

impl CartMergeCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Merge `guest` into `server` once per session. Entries the server
    /// rejects are logged and skipped; they do not abort the merge. When the
    /// cart store fails every entry the merge is deferred instead.
    ///
    /// # Errors
    ///
    /// Returns [`CartMergeError::Server`] if the final refresh fails.
    #[tracing::instrument(
        name = "cart_store.merge",
        skip_all,
        fields(user_uuid = %server.user(), items = guest.items().len()),
        err
    )]
    pub async fn merge<S: GuestStorage + Send>(
        &self,
        session: &mut MergeSession,
        guest: &mut GuestCart<S>,
        server: &mut ServerCartStore,
    ) -> Result<MergeOutcome, CartMergeError> {
        if !session.should_merge(server.user()) {
            return Ok(MergeOutcome::Skipped);
        }

        session.mark_merged();

        let mut merged = Vec::new();
        let mut failed = Vec::new();

        for item in guest.items().to_vec() {
            match server.add_item(item.product_uuid, item.quantity).await {
                Ok(_) => merged.push(item),
                Err(error) => {
                    warn!(
                        product_uuid = %item.product_uuid,
                        quantity = item.quantity,
                        %error,
                        "skipping guest cart item during merge"
                    );

                    failed.push(MergeFailure {
                        product_uuid: item.product_uuid,
                        quantity: item.quantity,
                        reason: error.to_string(),
                        retryable: error.is_transient(),
                    });
                }
            }
        }

        if merged.is_empty() && !failed.is_empty() && failed.iter().all(|f| f.retryable) {
            warn!(failed = failed.len(), "cart store unavailable; keeping guest cart");

            session.unmark_merged();

            return Ok(MergeOutcome::Deferred { failed });
        }

        guest.discard();

        server.refresh(true).await?;

        info!(merged = merged.len(), failed = failed.len(), "merged guest cart");

        Ok(MergeOutcome::Merged { merged, failed })
    }
}

/// Result of merging a posted guest snapshot.
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub outcome: MergeOutcome,
    pub cart: Cart,
}

/// Server-side merge for a bearer session. The once-per-token flag is claimed
/// in storage before any item is added, so concurrent requests cannot both
/// merge.
#[derive(Clone)]
pub struct SessionCartMerger {
    auth: Arc<dyn AuthService>,
    carts: Arc<dyn CartsService>,
    coordinator: CartMergeCoordinator,
}

impl SessionCartMerger {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthService>, carts: Arc<dyn CartsService>) -> Self {
        Self {
            auth,
            carts,
            coordinator: CartMergeCoordinator::new(),
        }
    }

    /// A deferred merge releases the claim so the client can retry with the
    /// same token.
    ///
    /// # Errors
    ///
    /// Returns [`CartMergeError::Auth`] if the merge flag cannot be claimed or
    /// released, or [`CartMergeError::Server`] if the cart cannot be read back.
    pub async fn merge_snapshot(
        &self,
        session: &Session,
        items: Vec<GuestCartItem>,
    ) -> Result<MergeReport, CartMergeError> {
        let mut server = ServerCartStore::new(Arc::clone(&self.carts), session.user_uuid());

        if session.cart_merged || !self.auth.mark_cart_merged(session.token_uuid).await? {
            let cart = server.refresh(true).await?.clone();

            return Ok(MergeReport {
                outcome: MergeOutcome::Skipped,
                cart,
            });
        }

        let mut guest = GuestCart::from_items(InMemoryGuestStorage::new(), items)?;
        let mut merge_session = MergeSession::new();

        let outcome = self
            .coordinator
            .merge(&mut merge_session, &mut guest, &mut server)
            .await?;

        if !outcome.discards_guest_cart() {
            self.auth.release_cart_merge(session.token_uuid).await?;
        }

        let cart = server.refresh(false).await?.clone();

        Ok(MergeReport { outcome, cart })
    }
}

impl std::fmt::Debug for SessionCartMerger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCartMerger").finish_non_exhaustive()
    }
}

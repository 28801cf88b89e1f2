//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    auth::{AuthService, PgAuthService},
    cart_store::SessionCartMerger,
    checkout::{CheckoutConfig, CheckoutService},
    database::{self, Db},
    domain::{
        addresses::{AddressesService, PgAddressesService},
        carts::{CartsService, PgCartsService},
        orders::{OrdersService, PgOrdersService},
        products::{PgProductsService, ProductsService},
        users::{PgUsersService, UsersService},
    },
    payments::{PaymentProcessor, PaymentsConfig, StripeClient},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

/// Service handles shared by every request.
#[derive(Clone)]
pub struct AppContext {
    pub users: Arc<dyn UsersService>,
    pub auth: Arc<dyn AuthService>,
    pub products: Arc<dyn ProductsService>,
    pub addresses: Arc<dyn AddressesService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub checkout: Arc<CheckoutService>,
    pub cart_merger: SessionCartMerger,
}

/// Individual services, for wiring a context with substitutes in tests.
pub struct AppServices {
    pub users: Arc<dyn UsersService>,
    pub auth: Arc<dyn AuthService>,
    pub products: Arc<dyn ProductsService>,
    pub addresses: Arc<dyn AddressesService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub payments: Arc<dyn PaymentProcessor>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(
        url: &str,
        payments: PaymentsConfig,
        checkout: CheckoutConfig,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);

        Ok(Self::from_services(
            AppServices {
                users: Arc::new(PgUsersService::new(db.clone())),
                auth: Arc::new(PgAuthService::new(db.clone())),
                products: Arc::new(PgProductsService::new(db.clone())),
                addresses: Arc::new(PgAddressesService::new(db.clone())),
                carts: Arc::new(PgCartsService::new(db.clone())),
                orders: Arc::new(PgOrdersService::new(db)),
                payments: Arc::new(StripeClient::new(payments)),
            },
            checkout,
        ))
    }

    #[must_use]
    pub fn from_services(services: AppServices, checkout: CheckoutConfig) -> Self {
        let checkout = CheckoutService::new(
            Arc::clone(&services.carts),
            Arc::clone(&services.addresses),
            Arc::clone(&services.orders),
            services.payments,
            checkout,
        );

        Self {
            cart_merger: SessionCartMerger::new(
                Arc::clone(&services.auth),
                Arc::clone(&services.carts),
            ),
            users: services.users,
            auth: services.auth,
            products: services.products,
            addresses: services.addresses,
            carts: services.carts,
            orders: services.orders,
            checkout: Arc::new(checkout),
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("checkout", &self.checkout)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices").finish_non_exhaustive()
    }
}

//! Carts service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};

use crate::{
    database::Db,
    domain::{
        carts::{
            data::NewCartItem,
            errors::CartsServiceError,
            records::Cart,
            repository::PgCartItemsRepository,
        },
        products::records::ProductUuid,
        users::records::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    repository: PgCartItemsRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCartItemsRepository::new(),
        }
    }

    /// Re-read the cart inside the mutating transaction and commit, so the
    /// caller sees exactly what was persisted.
    async fn commit_and_read(
        &self,
        mut tx: Transaction<'static, Postgres>,
        user: UserUuid,
    ) -> Result<Cart, CartsServiceError> {
        let lines = self.repository.get_cart_lines(&mut tx, user).await?;

        tx.commit().await?;

        Ok(Cart {
            user_uuid: user,
            lines,
        })
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_cart(&self, user: UserUuid) -> Result<Cart, CartsServiceError> {
        let tx = self.db.begin().await?;

        self.commit_and_read(tx, user).await
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self, item),
        fields(
            user_uuid = %user,
            product_uuid = %item.product_uuid,
            quantity = item.quantity
        ),
        err
    )]
    async fn add_item(&self, user: UserUuid, item: NewCartItem) -> Result<Cart, CartsServiceError> {
        if item.quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut tx = self.db.begin().await?;

        let rows_affected = self.repository.add_cart_item(&mut tx, user, item).await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::ProductNotFound);
        }

        self.commit_and_read(tx, user).await
    }

    async fn set_quantity(
        &self,
        user: UserUuid,
        product: ProductUuid,
        quantity: i64,
    ) -> Result<Cart, CartsServiceError> {
        if quantity <= 0 {
            return self.remove_item(user, product).await;
        }

        let quantity = u32::try_from(quantity).map_err(|_| CartsServiceError::InvalidQuantity)?;

        let mut tx = self.db.begin().await?;

        let rows_affected = self
            .repository
            .set_cart_item_quantity(&mut tx, user, product, quantity)
            .await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        self.commit_and_read(tx, user).await
    }

    async fn remove_item(
        &self,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<Cart, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        self.repository
            .remove_cart_item(&mut tx, user, product)
            .await?;

        self.commit_and_read(tx, user).await
    }

    async fn clear_cart(&self, user: UserUuid) -> Result<Cart, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        self.repository.clear_cart(&mut tx, user).await?;

        self.commit_and_read(tx, user).await
    }
}

/// Server-side cart storage. Every mutation returns the cart as persisted.
#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// The user's cart, joined with live product data.
    async fn get_cart(&self, user: UserUuid) -> Result<Cart, CartsServiceError>;

    /// Add a product, summing with any existing quantity for it.
    async fn add_item(&self, user: UserUuid, item: NewCartItem) -> Result<Cart, CartsServiceError>;

    /// Set the absolute quantity for a product already in the cart; zero or
    /// less removes it.
    async fn set_quantity(
        &self,
        user: UserUuid,
        product: ProductUuid,
        quantity: i64,
    ) -> Result<Cart, CartsServiceError>;

    /// Remove a product. Removing an absent product is not an error.
    async fn remove_item(
        &self,
        user: UserUuid,
        product: ProductUuid,
    ) -> Result<Cart, CartsServiceError>;

    async fn clear_cart(&self, user: UserUuid) -> Result<Cart, CartsServiceError>;
}

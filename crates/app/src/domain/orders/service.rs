//! Orders service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::{
    database::Db,
    domain::{
        orders::{
            data::{CreatedOrder, NewOrder},
            errors::OrdersServiceError,
            records::{OrderRecord, OrderStatus, OrderUuid},
            repositories::{PgOrderItemsRepository, PgOrdersRepository},
        },
        users::records::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    orders_repository: PgOrdersRepository,
    items_repository: PgOrderItemsRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders_repository: PgOrdersRepository::new(),
            items_repository: PgOrderItemsRepository::new(),
        }
    }

    async fn attach_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &mut [OrderRecord],
    ) -> Result<(), OrdersServiceError> {
        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        let items = self.items_repository.get_order_items(tx, &uuids).await?;

        for item in items {
            if let Some(order) = orders.iter_mut().find(|order| order.uuid == item.order_uuid) {
                order.items.push(item);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, order),
        fields(
            order_uuid = %order.uuid,
            user_uuid = %order.user_uuid,
            payment_intent_id = %order.payment_intent_id,
            item_count = order.items.len()
        ),
        err
    )]
    async fn create_order(&self, order: NewOrder) -> Result<CreatedOrder, OrdersServiceError> {
        if order.items.is_empty() {
            return Err(OrdersServiceError::NoItems);
        }

        // Dropping `tx` on any early return rolls back the header and every
        // item written so far.
        let mut tx = self.db.begin().await?;

        let created_at = self.orders_repository.create_order(&mut tx, &order).await?;

        for item in &order.items {
            self.items_repository
                .create_order_item(&mut tx, order.uuid, item)
                .await?;
        }

        tx.commit().await?;

        info!(total_amount = order.total_amount, "created order");

        Ok(CreatedOrder {
            uuid: order.uuid,
            created_at,
            order,
        })
    }

    async fn find_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut orders = [self.orders_repository.get_order(&mut tx, order).await?];

        self.attach_items(&mut tx, &mut orders).await?;

        tx.commit().await?;

        let [order] = orders;

        Ok(order)
    }

    async fn list_user_orders(
        &self,
        user: UserUuid,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut orders = self.orders_repository.list_user_orders(&mut tx, user).await?;

        self.attach_items(&mut tx, &mut orders).await?;

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.service.update_status",
        skip(self),
        fields(order_uuid = %order, status = %status),
        err
    )]
    async fn update_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self
            .orders_repository
            .update_order_status(&mut tx, order, status)
            .await?;

        if rows_affected == 0 {
            return Err(OrdersServiceError::NotFound);
        }

        let mut orders = [self.orders_repository.get_order(&mut tx, order).await?];

        self.attach_items(&mut tx, &mut orders).await?;

        tx.commit().await?;

        let [order] = orders;

        info!("updated order status");

        Ok(order)
    }
}

/// Durable orders. Headers and items are written together or not at all.
#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Persist an order header and all of its items in one transaction.
    async fn create_order(&self, order: NewOrder) -> Result<CreatedOrder, OrdersServiceError>;

    /// Retrieve an order with its items.
    async fn find_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError>;

    /// A user's orders with their items, newest first.
    async fn list_user_orders(
        &self,
        user: UserUuid,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Move an order to any status; prior status is not checked.
    async fn update_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::{
            orders::{data::NewOrderItem, records::OrderItemUuid},
            products::{ProductsService, records::ProductUuid},
            users::UsersService,
        },
        test::{
            TestContext,
            helpers::{address, new_product, new_user},
        },
    };

    use super::*;

    fn new_order(user: UserUuid, items: Vec<NewOrderItem>) -> NewOrder {
        NewOrder {
            uuid: OrderUuid::new(),
            user_uuid: user,
            total_amount: items
                .iter()
                .map(|item| item.price * u64::from(item.quantity))
                .sum(),
            currency: "USD".to_string(),
            shipping_address: address(),
            billing_address: address(),
            status: OrderStatus::Paid,
            payment_intent_id: format!("pi_{}", OrderUuid::new().into_uuid().simple()),
            items,
        }
    }

    fn item(product: ProductUuid, quantity: u32, price: u64) -> NewOrderItem {
        NewOrderItem {
            uuid: OrderItemUuid::new(),
            product_uuid: product,
            quantity,
            price,
        }
    }

    async fn count(ctx: &TestContext, table: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<sqlx::Postgres, i64>(&format!("SELECT count(*) FROM {table}"))
            .fetch_one(ctx.db.pool())
            .await
    }

    #[tokio::test]
    async fn create_order_persists_header_and_items() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.users.create_user(new_user("ada@example.com")).await?;
        let product = ctx.products.create_product(new_product(50_00)).await?;
        let order = new_order(user.uuid, vec![item(product.uuid, 1, 50_00)]);

        let created = ctx.orders.create_order(order.clone()).await?;

        assert_eq!(created.uuid, order.uuid);
        assert_eq!(created.order, order);

        let found = ctx.orders.find_order(created.uuid).await?;

        assert_eq!(found.total_amount, 50_00);
        assert_eq!(found.status, OrderStatus::Paid);
        assert_eq!(found.shipping_address, address());
        assert_eq!(found.payment_intent_id, order.payment_intent_id);
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].price, 50_00);
        assert_eq!(found.items[0].quantity, 1);
        assert_eq!(found.items[0].product_name, product.name);

        Ok(())
    }

    #[tokio::test]
    async fn failing_second_item_rolls_back_everything() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.users.create_user(new_user("ada@example.com")).await?;
        let product = ctx.products.create_product(new_product(10_00)).await?;

        let order = new_order(
            user.uuid,
            vec![
                item(product.uuid, 1, 10_00),
                item(ProductUuid::new(), 1, 5_00),
            ],
        );

        let result = ctx.orders.create_order(order.clone()).await;

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidData)),
            "expected InvalidData, got {result:?}"
        );
        assert_eq!(count(&ctx, "orders").await?, 0);
        assert_eq!(count(&ctx, "order_items").await?, 0);
        assert!(matches!(
            ctx.orders.find_order(order.uuid).await,
            Err(OrdersServiceError::NotFound)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn payment_intent_backs_at_most_one_order() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.users.create_user(new_user("ada@example.com")).await?;
        let product = ctx.products.create_product(new_product(10_00)).await?;

        let first = new_order(user.uuid, vec![item(product.uuid, 1, 10_00)]);
        let replay = NewOrder {
            uuid: OrderUuid::new(),
            items: vec![item(product.uuid, 1, 10_00)],
            ..first.clone()
        };

        ctx.orders.create_order(first).await?;

        let result = ctx.orders.create_order(replay).await;

        assert!(
            matches!(result, Err(OrdersServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );
        assert_eq!(count(&ctx, "orders").await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn order_without_items_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.users.create_user(new_user("ada@example.com")).await?;

        let result = ctx.orders.create_order(new_order(user.uuid, Vec::new())).await;

        assert!(matches!(result, Err(OrdersServiceError::NoItems)));

        Ok(())
    }

    #[tokio::test]
    async fn item_prices_are_snapshots() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.users.create_user(new_user("ada@example.com")).await?;
        let product = ctx.products.create_product(new_product(10_00)).await?;
        let order = new_order(user.uuid, vec![item(product.uuid, 2, 10_00)]);

        ctx.orders.create_order(order.clone()).await?;

        sqlx::query("UPDATE products SET sell_price = 99900 WHERE uuid = $1")
            .bind(product.uuid.into_uuid())
            .execute(ctx.db.pool())
            .await?;

        let found = ctx.orders.find_order(order.uuid).await?;

        assert_eq!(found.items[0].price, 10_00);
        assert_eq!(found.total_amount, 20_00);

        Ok(())
    }

    #[tokio::test]
    async fn list_user_orders_is_newest_first_and_scoped_to_user() -> TestResult {
        let ctx = TestContext::new().await;
        let ada = ctx.users.create_user(new_user("ada@example.com")).await?;
        let bob = ctx.users.create_user(new_user("bob@example.com")).await?;
        let product = ctx.products.create_product(new_product(10_00)).await?;

        let older = new_order(ada.uuid, vec![item(product.uuid, 1, 10_00)]);
        let newer = new_order(ada.uuid, vec![item(product.uuid, 3, 10_00)]);
        let other = new_order(bob.uuid, vec![item(product.uuid, 1, 10_00)]);

        ctx.orders.create_order(older.clone()).await?;
        ctx.orders.create_order(newer.clone()).await?;
        ctx.orders.create_order(other).await?;

        let orders = ctx.orders.list_user_orders(ada.uuid).await?;

        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        assert_eq!(uuids, vec![newer.uuid, older.uuid]);
        assert_eq!(orders[0].items[0].quantity, 3);
        assert_eq!(orders[1].items[0].quantity, 1);

        Ok(())
    }

    #[tokio::test]
    async fn update_status_allows_any_transition() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.users.create_user(new_user("ada@example.com")).await?;
        let product = ctx.products.create_product(new_product(10_00)).await?;
        let order = new_order(user.uuid, vec![item(product.uuid, 1, 10_00)]);

        ctx.orders.create_order(order.clone()).await?;

        let delivered = ctx
            .orders
            .update_status(order.uuid, OrderStatus::Delivered)
            .await?;
        let pending = ctx
            .orders
            .update_status(order.uuid, OrderStatus::Pending)
            .await?;

        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(pending.status, OrderStatus::Pending);
        assert_eq!(pending.items.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn update_status_of_unknown_order_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx
            .orders
            .update_status(OrderUuid::new(), OrderStatus::Shipped)
            .await;

        assert!(matches!(result, Err(OrdersServiceError::NotFound)));
    }
}

use clap::Args;
use storefront_app::domain::orders::{
    OrdersService, PgOrdersService,
    records::{OrderStatus, OrderUuid},
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct OrderStatusArgs {
    /// Order UUID
    #[arg(long)]
    order_uuid: Uuid,

    /// New status: pending, paid, shipped, delivered, cancelled or refunded
    #[arg(long)]
    status: OrderStatus,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: OrderStatusArgs) -> Result<(), String> {
    let db = crate::cli::connect(&args.database_url).await?;
    let service = PgOrdersService::new(db);

    let order = service
        .update_status(OrderUuid::from_uuid(args.order_uuid), args.status)
        .await
        .map_err(|error| format!("failed to update order: {error}"))?;

    println!("order_uuid: {}", order.uuid);
    println!("status: {}", order.status);
    println!("updated_at: {}", order.updated_at);

    Ok(())
}

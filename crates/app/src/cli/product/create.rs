use clap::Args;
use rust_decimal::Decimal;
use storefront_app::{
    domain::products::{
        PgProductsService, ProductsService,
        data::NewProduct,
        records::ProductUuid,
    },
    pricing::{format_amount, resolve_currency, to_minor_units},
};

#[derive(Debug, Args)]
pub(crate) struct CreateProductArgs {
    /// Product name
    #[arg(long)]
    name: String,

    /// List price in major units, e.g. 24.99
    #[arg(long)]
    price: Decimal,

    /// Selling price in major units; defaults to the list price
    #[arg(long)]
    sell_price: Option<Decimal>,

    /// Units in stock
    #[arg(long, default_value_t = 0)]
    stock: u32,

    /// Image URL; repeat for several
    #[arg(long = "image")]
    images: Vec<String>,

    /// ISO 4217 currency the prices are given in
    #[arg(long, env = "CHECKOUT_CURRENCY", default_value = "usd")]
    currency: String,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: CreateProductArgs) -> Result<(), String> {
    let currency = resolve_currency(&args.currency).map_err(|error| error.to_string())?;

    let price = to_minor_units(args.price, currency)
        .map_err(|error| format!("invalid price: {error}"))?;
    let sell_price = to_minor_units(args.sell_price.unwrap_or(args.price), currency)
        .map_err(|error| format!("invalid sell price: {error}"))?;

    let db = crate::cli::connect(&args.database_url).await?;
    let service = PgProductsService::new(db);

    let product = service
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            name: args.name,
            price,
            sell_price,
            stock: args.stock,
            images: args.images,
        })
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    println!("product_uuid: {}", product.uuid);
    println!("name: {}", product.name);
    println!("price: {}", format_amount(product.price, currency));
    println!("sell_price: {}", format_amount(product.sell_price, currency));
    println!("stock: {}", product.stock);

    Ok(())
}

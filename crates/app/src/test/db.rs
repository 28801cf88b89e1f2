//! Per-test Postgres databases inside one shared container.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::{OnceCell, mpsc};

const DB_USER: &str = "storefront_test";
const DB_PASSWORD: &str = "storefront_test_password";

/// Container shared by every test in the binary.
static POSTGRES_CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);

/// Databases queued for dropping once their `TestDb` goes away.
static DROP_QUEUE: Lazy<OnceCell<mpsc::UnboundedSender<String>>> = Lazy::new(OnceCell::new);

/// Only names we generated ourselves are ever interpolated into DDL.
fn is_safe_database_name(name: &str) -> bool {
    (1..=63).contains(&name.len())
        && name.starts_with(|c: char| c.is_ascii_lowercase())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

async fn start_container() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(DB_USER)
        .with_password(DB_PASSWORD)
        .with_db_name("storefront_test")
        .with_env_var("POSTGRES_INITDB_ARGS", "--auth-host=trust")
        .start()
        .await
        .expect("postgres container should start")
}

fn host() -> String {
    std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string())
}

async fn server_url(database: &str) -> Option<String> {
    let port = POSTGRES_CONTAINER
        .get()?
        .get_host_port_ipv4(5432)
        .await
        .ok()?;

    Some(format!(
        "postgresql://{DB_USER}:{DB_PASSWORD}@{}:{port}/{database}",
        host()
    ))
}

async fn start_drop_worker() -> mpsc::UnboundedSender<String> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(name) = receiver.recv().await {
            if !is_safe_database_name(&name) {
                continue;
            }

            let Some(url) = server_url("postgres").await else {
                continue;
            };

            if let Ok(mut conn) = PgConnection::connect(&url).await {
                let _dropped = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{name}\""))
                    .execute(&mut conn)
                    .await;
                let _closed = conn.close().await;
            }
        }
    });

    sender
}

/// A freshly migrated database, private to one test.
///
/// Services commit normally; isolation comes from every test owning its own
/// database, which is dropped in the background afterwards.
#[derive(Debug)]
pub(crate) struct TestDb {
    pool: PgPool,
    name: String,
}

impl TestDb {
    pub(crate) async fn new() -> Self {
        DROP_QUEUE.get_or_init(start_drop_worker).await;
        POSTGRES_CONTAINER.get_or_init(start_container).await;

        let name = format!("storefront_{}", uuid::Uuid::now_v7().simple());

        assert!(is_safe_database_name(&name), "generated name {name} is unsafe");

        let admin_url = server_url("postgres")
            .await
            .expect("container should expose port 5432");

        let mut admin = PgConnection::connect(&admin_url)
            .await
            .expect("should connect to maintenance database");

        sqlx::query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut admin)
            .await
            .expect("should create test database");

        admin.close().await.expect("should close admin connection");

        let url = server_url(&name)
            .await
            .expect("container should expose port 5432");

        let pool = PgPool::connect(&url)
            .await
            .expect("should connect to test database");

        crate::database::migrate(&pool)
            .await
            .expect("migrations should apply");

        Self { pool, name }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(queue) = DROP_QUEUE.get() {
            let _queued = queue.send(self.name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_are_safe() {
        assert!(is_safe_database_name("storefront_0190a1b2c3d4"));
    }

    #[test]
    fn hostile_names_are_rejected() {
        assert!(!is_safe_database_name(""));
        assert!(!is_safe_database_name("1starts_with_digit"));
        assert!(!is_safe_database_name("has-hyphen"));
        assert!(!is_safe_database_name("quote\"; DROP DATABASE x"));
        assert!(!is_safe_database_name(&"a".repeat(64)));
    }

    #[tokio::test]
    async fn each_test_database_is_migrated() {
        let db = TestDb::new().await;

        let tables: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name IN ('cart_items', 'orders')",
        )
        .fetch_one(db.pool())
        .await
        .expect("query should run");

        assert_eq!(tables, 2);
    }
}

use crate::config::AppConfig;
use crate::metrics::{increment_counter, set_gauge};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait};
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use utoipa::ToSchema;

use crate::entities::{
    branch, category, chat_message, company, customer, franchise_application, order, order_item,
    product, restaurant_table, sales_record, sales_record_item, table_payment, user, user_address,
};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database
pub async fn establish_connection(database_url: &str) -> Result<DbPool, DbErr> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };

    establish_connection_with_config(&config).await
}

/// Establishes a connection pool to the database with custom configuration
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, DbErr> {
    let mut opt = ConnectOptions::new(config.url.clone());

    opt.connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .sqlx_logging(false);

    // Every connection to an in-memory SQLite database opens a fresh database
    if is_in_memory_sqlite(&config.url) {
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .idle_timeout(config.idle_timeout);
    }

    set_gauge("db_max_connections", config.max_connections as f64);

    info!(
        max_connections = config.max_connections,
        "Connecting to database"
    );

    let pool = Database::connect(opt).await?;
    info!("Database connection pool established successfully");
    Ok(pool)
}

pub fn is_in_memory_sqlite(url: &str) -> bool {
    url.starts_with("sqlite") && (url.contains(":memory:") || url.contains("mode=memory"))
}

/// Runs the embedded migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbErr> {
    info!("Running database migrations");
    let start = Instant::now();

    let result = crate::migrator::Migrator::up(pool, None).await;

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!("Database migrations completed successfully in {:?}", elapsed),
        Err(e) => error!("Database migrations failed after {:?}: {}", elapsed, e),
    }

    result
}

/// Pings the database, returning the round trip time
pub async fn check_connection(pool: &DbPool) -> Result<Duration, DbErr> {
    let start = Instant::now();
    let result = pool.ping().await;
    let elapsed = start.elapsed();

    match &result {
        Ok(_) => {
            debug!("Database connection check successful in {:?}", elapsed);
            set_gauge("db_connection_latency_ms", elapsed.as_secs_f64() * 1000.0);
        }
        Err(e) => {
            error!("Database connection check failed after {:?}: {}", elapsed, e);
            increment_counter("db_connection_failures_total");
        }
    }

    result.map(|_| elapsed)
}

/// Row count of a single table
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TableCount {
    pub table: &'static str,
    pub rows: u64,
}

async fn count<E: EntityTrait>(pool: &DbPool, table: &'static str) -> Result<TableCount, DbErr>
where
    E::Model: Sync,
{
    let rows = E::find().count(pool).await?;
    Ok(TableCount { table, rows })
}

/// Row counts of every application table
pub async fn table_counts(pool: &DbPool) -> Result<Vec<TableCount>, DbErr> {
    Ok(vec![
        count::<company::Entity>(pool, "companies").await?,
        count::<branch::Entity>(pool, "branches").await?,
        count::<user::Entity>(pool, "users").await?,
        count::<category::Entity>(pool, "categories").await?,
        count::<product::Entity>(pool, "products").await?,
        count::<restaurant_table::Entity>(pool, "restaurant_tables").await?,
        count::<customer::Entity>(pool, "customers").await?,
        count::<user_address::Entity>(pool, "user_addresses").await?,
        count::<order::Entity>(pool, "orders").await?,
        count::<order_item::Entity>(pool, "order_items").await?,
        count::<table_payment::Entity>(pool, "table_payments").await?,
        count::<sales_record::Entity>(pool, "sales_records").await?,
        count::<sales_record_item::Entity>(pool, "sales_record_items").await?,
        count::<chat_message::Entity>(pool, "chat_messages").await?,
        count::<franchise_application::Entity>(pool, "franchise_applications").await?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrated_sqlite_database_reports_empty_tables() {
        let pool = establish_connection("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        assert!(check_connection(&pool).await.is_ok());
        let counts = table_counts(&pool).await.unwrap();
        assert_eq!(counts.len(), 15);
        assert!(counts.iter().all(|c| c.rows == 0));
    }
}

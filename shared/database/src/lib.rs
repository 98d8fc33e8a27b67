pub mod postgres;
pub mod migrations;
pub mod repositories;
pub mod import_store;

pub use postgres::{PostgresPool, create_postgres_pool, health_check as postgres_health_check};
pub use import_store::{PgImportStore, PgImportTransaction};
pub use repositories::*;

use anyhow::Result;
use fieldops_utils::DatabaseConfig;
use std::time::Duration;

/// Connect to PostgreSQL and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> Result<PostgresPool> {
    let pool = create_postgres_pool(
        &config.postgres_url,
        config.max_connections,
        Duration::from_secs(config.connection_timeout_seconds),
    )
    .await?;

    migrations::run_postgres_migrations(&pool).await?;

    Ok(pool)
}

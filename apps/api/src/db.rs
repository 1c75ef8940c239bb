use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates the PostgreSQL pool shared by the listings store and the vault reader.
/// The connection is established lazily so a database outage degrades
/// persistence and scoring instead of blocking startup.
pub fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_lazy(database_url)
        .context("DATABASE_URL is not a valid Postgres connection string")?;

    info!("PostgreSQL connection pool configured");
    Ok(pool)
}

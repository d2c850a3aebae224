use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::journal::repository::PgEntryRepository;

/// Connects to PostgreSQL and makes sure the journal schema exists.
pub async fn connect_entry_store(database_url: &str) -> Result<PgEntryRepository> {
    info!("Connecting to PostgreSQL...");

    let pool: PgPool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    let repo = PgEntryRepository::new(pool);
    repo.ensure_schema().await?;

    info!("Journal entry store ready");
    Ok(repo)
}

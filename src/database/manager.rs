use once_cell::sync::OnceCell;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config;

/// Errors from the database layer
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("database pool not initialized")]
    NotInitialized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

static POOL: OnceCell<PgPool> = OnceCell::new();

/// Connect the process-wide pool from DATABASE_URL and run pending
/// migrations when the config says so. Called once at startup.
pub async fn init() -> Result<&'static PgPool, DbError> {
    let url = std::env::var("DATABASE_URL").map_err(|_| DbError::ConfigMissing("DATABASE_URL"))?;
    let cfg = &config::config().database;

    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(Duration::from_secs(cfg.connection_timeout_secs))
        .connect(&url)
        .await?;

    if cfg.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations applied");
    }

    let _ = POOL.set(pool);
    info!("database pool ready");
    POOL.get().ok_or(DbError::NotInitialized)
}

/// Shared pool accessor for handlers. Errors until `init` has run, which the
/// error layer turns into a 503.
pub fn pool() -> Result<&'static PgPool, DbError> {
    POOL.get().ok_or(DbError::NotInitialized)
}

/// Pings the pool to ensure connectivity
pub async fn health_check() -> Result<(), DbError> {
    let pool = pool()?;
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

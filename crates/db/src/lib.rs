//! PostgreSQL pool factory for shelf.
//!
//! One bounded pool is built at startup and shared by every request; handlers
//! never open connections of their own.

use std::time::Duration;

use anyhow::Context;
use shelf_kernel::settings::DatabaseSettings;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

/// Translate database settings into driver connect options.
pub fn connect_options(settings: &DatabaseSettings) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .password(&settings.password)
        .database(&settings.name)
}

/// Pool options with the configured bounds.
pub fn pool_options(settings: &DatabaseSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms))
}

/// Build the pool and verify the database is reachable.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    tracing::info!(
        target: "shelf-db",
        endpoint = %settings.endpoint(),
        max_connections = settings.max_connections,
        "connecting to database"
    );

    let pool = pool_options(settings)
        .connect_with(connect_options(settings))
        .await
        .with_context(|| format!("failed to connect to {}", settings.endpoint()))?;

    tracing::info!(target: "shelf-db", "database pool ready");
    Ok(pool)
}

/// Close every pooled connection; waits for checked-out connections to return.
pub async fn close(pool: &PgPool) {
    pool.close().await;
    tracing::info!(target: "shelf-db", "database pool closed");
}

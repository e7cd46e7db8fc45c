//! PostgreSQL 凭据存储的连接池与表结构迁移

use crate::config::DatabaseConfig;
use secrecy::{ExposeSecret, Secret};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),
}

/// 按配置建立连接池；URL 仅在连接时暴露
pub async fn create_pool(url: &Secret<String>, config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(url.expose_secret())
        .await
        .map_err(DbError::ConnectionFailed)?;

    tracing::info!(
        max_connections = config.max_connections,
        "Credential store pool ready"
    );

    Ok(pool)
}

/// 执行 migrations/ 下嵌入的迁移（users 表及邮箱唯一索引）
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(DbError::MigrationFailed)?;

    tracing::info!("Credential store schema up to date");
    Ok(())
}

//! # Schema Bootstrap
//!
//! Creates the `products` table when it is missing.
//!
//! ```text
//! App Startup
//!      │
//!      ▼
//! ConnectionPool::connect
//!      │
//!      ▼
//! schema::bootstrap ── CREATE TABLE IF NOT EXISTS products (...)
//!      │
//!      ▼
//! ProductRepository is ready
//! ```
//!
//! The repository assumes the table exists and never creates or alters it.

use tracing::info;

use crate::error::StoreResult;
use crate::pool::ConnectionPool;

/// Idempotent table definition.
pub const CREATE_PRODUCTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY,
        good TEXT NOT NULL,
        price REAL NOT NULL,
        category_name TEXT NOT NULL
    )
"#;

/// Creates the `products` table if it does not exist.
///
/// Safe to run on every startup.
pub async fn bootstrap(pool: &ConnectionPool) -> StoreResult<()> {
    const OPERATION: &str = "schema::bootstrap";

    info!("Ensuring products table exists");

    let mut conn = pool.acquire(OPERATION).await?;
    pool.run(
        conn.interrupt(),
        OPERATION,
        sqlx::query(CREATE_PRODUCTS_TABLE).execute(&mut *conn),
    )
    .await?;

    info!("Schema ready");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolConfig;

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let pool = ConnectionPool::connect(PoolConfig::in_memory()).await.unwrap();

        bootstrap(&pool).await.unwrap();
        bootstrap(&pool).await.unwrap();

        assert_eq!(pool.products().count().await.unwrap(), 0);
        assert_eq!(pool.checked_out(), 0);
    }

    #[tokio::test]
    async fn test_repository_without_schema_is_storage_error() {
        let pool = ConnectionPool::connect(PoolConfig::in_memory()).await.unwrap();

        let err = pool.products().get_all().await.unwrap_err();
        assert_eq!(err.code(), 2);
        assert_eq!(
            err.details().as_deref(),
            Some("ProductRepository::get_all: query failed")
        );
        assert_eq!(pool.checked_out(), 0);
    }
}

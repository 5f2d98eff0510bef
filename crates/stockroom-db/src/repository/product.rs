//! # Product Repository
//!
//! CRUD, query and bulk-mutation operations on the `products` table.
//!
//! ## Operation Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Every Repository Call                                │
//! │                                                                         │
//! │  caller                                                                │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  pool.acquire(op) ─────────────► ConnectionHandle (exclusive)          │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  one parameterized statement                                           │
//! │  (create_batch: BEGIN → N inserts → COMMIT, ROLLBACK on any failure)   │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  map rows → Product                                                    │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  handle dropped → connection back in pool (on every exit path)         │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  Ok(result) | Err(ClassifiedError naming `ProductRepository::<op>`)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Absence vs Fault
//! A lookup that finds nothing (`get_by_id`, empty ranges, unknown
//! categories) is a normal `None`/empty result. Zero affected rows on a
//! mutation is not a fault either.

use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Connection, Row, Sqlite};
use tracing::{debug, warn};

use crate::error::{storage_error, transaction_error, StoreResult};
use crate::pool::ConnectionPool;
use stockroom_core::Product;

const SELECT_ALL: &str = "SELECT id, good, price, category_name FROM products";

const SELECT_BY_ID: &str = "SELECT id, good, price, category_name FROM products WHERE id = ?";

const SELECT_MOST_EXPENSIVE: &str = r#"
    SELECT id, good, price, category_name
    FROM products
    WHERE price = (SELECT MAX(price) FROM products)
"#;

const SELECT_PRICE_RANGE: &str = r#"
    SELECT id, good, price, category_name
    FROM products
    WHERE price BETWEEN ? AND ?
"#;

const INSERT: &str = "INSERT INTO products (id, good, price, category_name) VALUES (?, ?, ?, ?)";

const UPDATE: &str = r#"
    UPDATE products
    SET id = ?, good = ?, price = ?, category_name = ?
    WHERE id = ?
"#;

const INCREASE_CATEGORY_PRICE: &str =
    "UPDATE products SET price = price + price * ? WHERE category_name = ?";

const DELETE_BY_ID: &str = "DELETE FROM products WHERE id = ?";

const DELETE_BY_CATEGORY: &str = "DELETE FROM products WHERE category_name = ?";

// SQLite has no TRUNCATE
const DELETE_ALL: &str = "DELETE FROM products";

const COUNT: &str = "SELECT COUNT(*) FROM products";

/// Maps a result row to a [`Product`].
///
/// Columns `id`, `good`, `price` and `category_name` map 1:1 onto the
/// product fields.
pub fn map_product(row: &SqliteRow) -> Result<Product, sqlx::Error> {
    Ok(Product::new(
        row.try_get::<i32, _>("id")?,
        row.try_get::<String, _>("good")?,
        row.try_get::<f64, _>("price")?,
        row.try_get::<String, _>("category_name")?,
    ))
}

fn bind_product<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    product: &'q Product,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    query
        .bind(product.id)
        .bind(product.good.as_str())
        .bind(product.price)
        .bind(product.category_name.as_str())
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool.clone());
///
/// repo.create(&Product::new(1, "Samsung QLED", 499.0, "tv")).await?;
/// let product = repo.get_by_id(1).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: ConnectionPool,
}

impl ProductRepository {
    /// Creates a new ProductRepository over the given pool.
    pub fn new(pool: ConnectionPool) -> Self {
        ProductRepository { pool }
    }

    /// Returns all products.
    ///
    /// Order is not guaranteed; sort on the caller side if it matters.
    pub async fn get_all(&self) -> StoreResult<Vec<Product>> {
        const OPERATION: &str = "ProductRepository::get_all";

        debug!("Fetching all products");
        self.fetch_products(OPERATION, sqlx::query(SELECT_ALL)).await
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i32) -> StoreResult<Option<Product>> {
        const OPERATION: &str = "ProductRepository::get_by_id";

        debug!(id, "Fetching product");

        let mut conn = self.pool.acquire(OPERATION).await?;
        let row = self
            .pool
            .run(
                conn.interrupt(),
                OPERATION,
                sqlx::query(SELECT_BY_ID).bind(id).fetch_optional(&mut *conn),
            )
            .await?;

        row.as_ref()
            .map(map_product)
            .transpose()
            .map_err(|e| storage_error(OPERATION, e))
    }

    /// Returns every product priced at the table-wide maximum.
    ///
    /// Ties are all returned; an empty table yields an empty result.
    pub async fn get_most_expensive(&self) -> StoreResult<Vec<Product>> {
        const OPERATION: &str = "ProductRepository::get_most_expensive";

        debug!("Fetching most expensive products");
        self.fetch_products(OPERATION, sqlx::query(SELECT_MOST_EXPENSIVE))
            .await
    }

    /// Returns products with `from <= price <= to`.
    ///
    /// Bounds are inclusive and not validated: `from > to` simply matches
    /// nothing.
    pub async fn get_products_with_price_range(
        &self,
        from: f64,
        to: f64,
    ) -> StoreResult<Vec<Product>> {
        const OPERATION: &str = "ProductRepository::get_products_with_price_range";

        debug!(from, to, "Fetching products in price range");
        self.fetch_products(
            OPERATION,
            sqlx::query(SELECT_PRICE_RANGE).bind(from).bind(to),
        )
        .await
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(())` - Inserted
    /// * `Err(ClassifiedError::Storage)` - The id already exists ("duplicate id")
    pub async fn create(&self, product: &Product) -> StoreResult<()> {
        const OPERATION: &str = "ProductRepository::create";

        debug!(id = product.id, good = %product.good, "Inserting product");
        self.execute(OPERATION, bind_product(sqlx::query(INSERT), product))
            .await?;
        Ok(())
    }

    /// Inserts several products in one transaction.
    ///
    /// ## Atomicity
    /// ```text
    /// BEGIN
    ///   INSERT p1 ✓
    ///   INSERT p2 ✓
    ///   INSERT p3 ✗ (duplicate id)
    /// ROLLBACK  → p1 and p2 are discarded, one StorageError is returned
    /// ```
    ///
    /// The statement deadline covers BEGIN and each INSERT, not COMMIT: an
    /// abandoned COMMIT may still apply on the worker.
    pub async fn create_batch(&self, products: &[Product]) -> StoreResult<()> {
        const OPERATION: &str = "ProductRepository::create_batch";

        debug!(count = products.len(), "Inserting product batch");

        let mut conn = self.pool.acquire(OPERATION).await?;
        let interrupt = conn.interrupt();
        let mut tx = self
            .pool
            .run_mapped(
                interrupt.clone(),
                OPERATION,
                Connection::begin(&mut *conn),
                transaction_error,
            )
            .await?;

        for product in products {
            let inserted = self
                .pool
                .run(
                    interrupt.clone(),
                    OPERATION,
                    bind_product(sqlx::query(INSERT), product).execute(&mut *tx),
                )
                .await;

            if let Err(err) = inserted {
                warn!(id = product.id, "Batch insert failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                return Err(err);
            }
        }

        tx.commit()
            .await
            .map_err(|e| transaction_error(OPERATION, e))?;

        debug!(count = products.len(), "Product batch committed");
        Ok(())
    }

    /// Replaces the row identified by `id` with `product`'s fields.
    ///
    /// `product.id` becomes the row's new id, so an update can move a row to
    /// a different primary key. An unknown `id` is a no-op.
    pub async fn update(&self, id: i32, product: &Product) -> StoreResult<()> {
        const OPERATION: &str = "ProductRepository::update";

        debug!(id, new_id = product.id, "Updating product");
        let affected = self
            .execute(
                OPERATION,
                bind_product(sqlx::query(UPDATE), product).bind(id),
            )
            .await?;

        debug!(id, affected, "Product update applied");
        Ok(())
    }

    /// Applies `price += price * percent` to every product in `category`.
    ///
    /// `0.5` raises prices by half. No matching rows is not an error.
    pub async fn increase_category_price(&self, category: &str, percent: f64) -> StoreResult<()> {
        const OPERATION: &str = "ProductRepository::increase_category_price";

        debug!(category, percent, "Increasing category price");
        let affected = self
            .execute(
                OPERATION,
                sqlx::query(INCREASE_CATEGORY_PRICE)
                    .bind(percent)
                    .bind(category),
            )
            .await?;

        debug!(category, affected, "Category price increased");
        Ok(())
    }

    /// Removes the product with `id`. No-op if absent.
    pub async fn delete(&self, id: i32) -> StoreResult<()> {
        const OPERATION: &str = "ProductRepository::delete";

        debug!(id, "Deleting product");
        self.execute(OPERATION, sqlx::query(DELETE_BY_ID).bind(id))
            .await?;
        Ok(())
    }

    /// Removes every product in `category`. No-op if none match.
    pub async fn delete_all_category_products(&self, category: &str) -> StoreResult<()> {
        const OPERATION: &str = "ProductRepository::delete_all_category_products";

        debug!(category, "Deleting category products");
        let affected = self
            .execute(OPERATION, sqlx::query(DELETE_BY_CATEGORY).bind(category))
            .await?;

        debug!(category, affected, "Category products deleted");
        Ok(())
    }

    /// Removes all products.
    pub async fn truncate(&self) -> StoreResult<()> {
        const OPERATION: &str = "ProductRepository::truncate";

        debug!("Truncating products");
        self.execute(OPERATION, sqlx::query(DELETE_ALL)).await?;
        Ok(())
    }

    /// Counts all products (for diagnostics).
    pub async fn count(&self) -> StoreResult<i64> {
        const OPERATION: &str = "ProductRepository::count";

        let mut conn = self.pool.acquire(OPERATION).await?;
        let count: i64 = self
            .pool
            .run(
                conn.interrupt(),
                OPERATION,
                sqlx::query_scalar(COUNT).fetch_one(&mut *conn),
            )
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn fetch_products<'q>(
        &self,
        operation: &'static str,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> StoreResult<Vec<Product>> {
        let mut conn = self.pool.acquire(operation).await?;
        let rows = self
            .pool
            .run(conn.interrupt(), operation, query.fetch_all(&mut *conn))
            .await?;

        let products = rows
            .iter()
            .map(map_product)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| storage_error(operation, e))?;

        debug!(operation, count = products.len(), "Query returned products");
        Ok(products)
    }

    async fn execute<'q>(
        &self,
        operation: &'static str,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> StoreResult<u64> {
        let mut conn = self.pool.acquire(operation).await?;
        let result = self
            .pool
            .run(conn.interrupt(), operation, query.execute(&mut *conn))
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::pool::PoolConfig;
    use crate::schema;
    use stockroom_core::{CancelStage, ClassifiedError};

    async fn setup() -> (ConnectionPool, ProductRepository) {
        let pool = ConnectionPool::connect(PoolConfig::in_memory()).await.unwrap();
        schema::bootstrap(&pool).await.unwrap();
        let repo = ProductRepository::new(pool.clone());
        (pool, repo)
    }

    /// Inserts products 1..=amount priced 10.0, 20.0, ... in category "all".
    async fn fill_products_table(repo: &ProductRepository, amount: i32) -> Vec<Product> {
        let products: Vec<Product> = (1..=amount)
            .map(|i| Product::new(i, i.to_string(), f64::from(i) * 10.0, "all"))
            .collect();

        repo.create_batch(&products).await.unwrap();
        products
    }

    fn sorted(mut products: Vec<Product>) -> Vec<Product> {
        products.sort_by_key(|p| p.id);
        products
    }

    fn assert_duplicate_id(err: &ClassifiedError, operation: &str) {
        assert_eq!(err.code(), 2);
        assert_eq!(
            err.details().as_deref(),
            Some(format!("{operation}: duplicate id").as_str())
        );
        assert!(err.has_cause());
    }

    #[tokio::test]
    async fn test_get_all_filled_table() {
        let (_pool, repo) = setup().await;
        let expected = fill_products_table(&repo, 5).await;

        let products = sorted(repo.get_all().await.unwrap());

        assert_eq!(products, expected);
    }

    #[tokio::test]
    async fn test_get_all_empty_table() {
        let (_pool, repo) = setup().await;

        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id_existing_product() {
        let (_pool, repo) = setup().await;
        let expected = fill_products_table(&repo, 1).await;

        assert_eq!(repo.get_by_id(1).await.unwrap(), Some(expected[0].clone()));
    }

    #[tokio::test]
    async fn test_get_by_id_missing_product_is_absent() {
        let (_pool, repo) = setup().await;
        fill_products_table(&repo, 3).await;

        assert_eq!(repo.get_by_id(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_most_expensive_single() {
        let (_pool, repo) = setup().await;
        let created = fill_products_table(&repo, 5).await;

        let products = repo.get_most_expensive().await.unwrap();

        assert_eq!(products, vec![created[4].clone()]);
    }

    #[tokio::test]
    async fn test_get_most_expensive_ties() {
        let (_pool, repo) = setup().await;
        let created = fill_products_table(&repo, 5).await;
        let tie = Product::new(6, "6", created[4].price, "all");
        repo.create(&tie).await.unwrap();

        let products = sorted(repo.get_most_expensive().await.unwrap());

        assert_eq!(products, vec![created[4].clone(), tie]);
    }

    #[tokio::test]
    async fn test_get_most_expensive_empty_table() {
        let (_pool, repo) = setup().await;

        assert!(repo.get_most_expensive().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_price_range_is_inclusive() {
        let (_pool, repo) = setup().await;
        let created = fill_products_table(&repo, 5).await;
        let expected: Vec<Product> = created
            .into_iter()
            .filter(|p| p.price >= 10.0 && p.price <= 20.0)
            .collect();

        let products = sorted(repo.get_products_with_price_range(10.0, 20.0).await.unwrap());

        assert_eq!(products.len(), 2);
        assert_eq!(products, expected);
    }

    #[tokio::test]
    async fn test_price_range_without_matches() {
        let (_pool, repo) = setup().await;
        fill_products_table(&repo, 5).await;

        let products = repo
            .get_products_with_price_range(1_000_000.0, 2_000_000.0)
            .await
            .unwrap();
        assert!(products.is_empty());

        // reversed bounds match nothing
        assert!(repo
            .get_products_with_price_range(20.0, 10.0)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_price_range_empty_table() {
        let (_pool, repo) = setup().await;

        let products = repo
            .get_products_with_price_range(1_000_000.0, 2_000_000.0)
            .await
            .unwrap();
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_create() {
        let (_pool, repo) = setup().await;
        let expected = Product::new(1, "1", 10.0, "all");

        repo.create(&expected).await.unwrap();

        assert_eq!(repo.get_by_id(1).await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn test_create_duplicate_is_storage_error() {
        let (pool, repo) = setup().await;
        let products = fill_products_table(&repo, 1).await;

        let err = repo.create(&products[0]).await.unwrap_err();

        assert_duplicate_id(&err, "ProductRepository::create");
        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(pool.checked_out(), 0);
    }

    #[tokio::test]
    async fn test_create_batch() {
        let (_pool, repo) = setup().await;
        let expected = Product::new(1, "1", 10.0, "all");

        repo.create_batch(std::slice::from_ref(&expected)).await.unwrap();

        assert_eq!(repo.get_by_id(1).await.unwrap(), Some(expected));
    }

    #[tokio::test]
    async fn test_create_batch_empty_is_noop() {
        let (_pool, repo) = setup().await;

        repo.create_batch(&[]).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_batch_is_atomic() {
        let (pool, repo) = setup().await;
        repo.create(&Product::new(100, "existing", 1.0, "all"))
            .await
            .unwrap();

        let mut batch: Vec<Product> = (1..=5)
            .map(|i| Product::new(i, i.to_string(), f64::from(i) * 10.0, "all"))
            .collect();
        batch.push(Product::new(100, "100", 1.0, "all"));

        let err = repo.create_batch(&batch).await.unwrap_err();

        assert_duplicate_id(&err, "ProductRepository::create_batch");
        let remaining = repo.get_all().await.unwrap();
        assert_eq!(remaining, vec![Product::new(100, "existing", 1.0, "all")]);
        assert_eq!(pool.checked_out(), 0);
    }

    #[tokio::test]
    async fn test_create_batch_duplicate_within_batch() {
        let (_pool, repo) = setup().await;
        let batch = vec![
            Product::new(1, "a", 1.0, "all"),
            Product::new(2, "b", 2.0, "all"),
            Product::new(1, "c", 3.0, "all"),
        ];

        assert!(repo.create_batch(&batch).await.is_err());
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_all_fields() {
        let (_pool, repo) = setup().await;
        fill_products_table(&repo, 5).await;
        let expected = Product::new(1, "new", 1.0, "new");

        repo.update(1, &expected).await.unwrap();

        assert_eq!(repo.get_by_id(1).await.unwrap(), Some(expected));
        assert_eq!(repo.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_update_can_change_id() {
        let (_pool, repo) = setup().await;
        fill_products_table(&repo, 1).await;
        let moved = Product::new(2, "moved", 5.0, "all");

        repo.update(1, &moved).await.unwrap();

        assert_eq!(repo.get_by_id(1).await.unwrap(), None);
        assert_eq!(repo.get_by_id(2).await.unwrap(), Some(moved));
    }

    #[tokio::test]
    async fn test_update_missing_id_is_noop() {
        let (_pool, repo) = setup().await;
        let created = fill_products_table(&repo, 2).await;

        repo.update(42, &Product::new(42, "ghost", 1.0, "all"))
            .await
            .unwrap();

        assert_eq!(sorted(repo.get_all().await.unwrap()), created);
    }

    #[tokio::test]
    async fn test_update_onto_taken_id_is_storage_error() {
        let (_pool, repo) = setup().await;
        fill_products_table(&repo, 2).await;

        let err = repo
            .update(1, &Product::new(2, "clash", 1.0, "all"))
            .await
            .unwrap_err();

        assert_duplicate_id(&err, "ProductRepository::update");
    }

    #[tokio::test]
    async fn test_increase_category_price() {
        let (_pool, repo) = setup().await;
        repo.create_batch(&[
            Product::new(1, "samsung", 10.0, "tv"),
            Product::new(2, "other", 10.0, "other"),
        ])
        .await
        .unwrap();

        repo.increase_category_price("tv", 0.5).await.unwrap();

        let tv = repo.get_by_id(1).await.unwrap().unwrap();
        assert!((tv.price - 15.0).abs() < 1e-9);

        let other = repo.get_by_id(2).await.unwrap().unwrap();
        assert!((other.price - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_increase_unknown_category_is_noop() {
        let (_pool, repo) = setup().await;
        let created = fill_products_table(&repo, 3).await;

        repo.increase_category_price("missing", 0.5).await.unwrap();

        assert_eq!(sorted(repo.get_all().await.unwrap()), created);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_pool, repo) = setup().await;
        fill_products_table(&repo, 5).await;

        repo.delete(5).await.unwrap();

        let products = repo.get_all().await.unwrap();
        assert_eq!(products.len(), 4);
        assert!(products.iter().all(|p| p.id != 5));
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_noop() {
        let (_pool, repo) = setup().await;
        let created = fill_products_table(&repo, 3).await;

        repo.delete(999).await.unwrap();

        assert_eq!(sorted(repo.get_all().await.unwrap()), created);
    }

    #[tokio::test]
    async fn test_delete_all_category_products() {
        let (_pool, repo) = setup().await;
        repo.create_batch(&[
            Product::new(1, "samsung", 10.0, "tv"),
            Product::new(2, "other", 20.0, "other"),
        ])
        .await
        .unwrap();

        repo.delete_all_category_products("tv").await.unwrap();
        repo.delete_all_category_products("nothing-here").await.unwrap();

        let products = repo.get_all().await.unwrap();
        assert_eq!(products, vec![Product::new(2, "other", 20.0, "other")]);
    }

    #[tokio::test]
    async fn test_truncate() {
        let (_pool, repo) = setup().await;
        fill_products_table(&repo, 10).await;

        repo.truncate().await.unwrap();
        assert!(repo.get_all().await.unwrap().is_empty());

        // empty table stays empty
        repo.truncate().await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_errors_release_connections() {
        let (pool, repo) = setup().await;
        fill_products_table(&repo, 2).await;

        for _ in 0..3 {
            assert!(repo.create(&Product::new(1, "dup", 1.0, "all")).await.is_err());
        }

        assert_eq!(pool.checked_out(), 0);
        // single-connection pool is still usable after repeated failures
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_busy_pool_reports_cancellation() {
        let config = PoolConfig::in_memory().acquire_timeout(Duration::from_millis(100));
        let pool = ConnectionPool::connect(config).await.unwrap();
        schema::bootstrap(&pool).await.unwrap();
        let repo = pool.products();

        let held = pool.acquire("holder").await.unwrap();
        let err = repo.get_all().await.unwrap_err();
        drop(held);

        assert!(matches!(
            err,
            ClassifiedError::Cancelled {
                operation: "ProductRepository::get_all",
                stage: CancelStage::AwaitingConnection,
            }
        ));
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    /// Counts a billion rows; far longer than any test deadline.
    const RUNAWAY_QUERY: &str = r#"
        WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 1000000000)
        SELECT COUNT(*) FROM c
    "#;

    async fn setup_with_deadline(limit: Duration) -> (ConnectionPool, ProductRepository) {
        let config = PoolConfig::in_memory().statement_timeout(Some(limit));
        let pool = ConnectionPool::connect(config).await.unwrap();
        schema::bootstrap(&pool).await.unwrap();
        let repo = pool.products();
        (pool, repo)
    }

    fn assert_statement_cancelled(err: &ClassifiedError, expected: &str) {
        assert!(
            matches!(
                err,
                ClassifiedError::Cancelled {
                    operation,
                    stage: CancelStage::AwaitingStatement,
                } if *operation == expected
            ),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_statement_deadline_interrupts_statement() {
        let (pool, repo) = setup_with_deadline(Duration::from_millis(50)).await;
        fill_products_table(&repo, 2).await;

        let mut conn = pool.acquire("runaway").await.unwrap();
        let err = pool
            .run(
                conn.interrupt(),
                "runaway",
                sqlx::query_scalar::<_, i64>(RUNAWAY_QUERY).fetch_one(&mut *conn),
            )
            .await
            .unwrap_err();
        drop(conn);

        assert_statement_cancelled(&err, "runaway");
        assert_eq!(pool.checked_out(), 0);

        // The interrupted connection is idle again, not busy until acquire_timeout
        let started = Instant::now();
        assert_eq!(repo.get_all().await.unwrap().len(), 2);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(pool.checked_out(), 0);
    }

    #[tokio::test]
    async fn test_statement_deadline_inside_batch_persists_nothing() {
        let (pool, repo) = setup_with_deadline(Duration::from_millis(200)).await;
        {
            // Inserting id 3 fires a trigger that scans a billion-row join
            let mut conn = pool.acquire("slow_trigger").await.unwrap();
            for sql in [
                "CREATE TABLE ticks (n INTEGER NOT NULL)",
                r#"WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 1000)
                   INSERT INTO ticks SELECT x FROM c"#,
                r#"CREATE TRIGGER slow_insert AFTER INSERT ON products WHEN NEW.id = 3
                   BEGIN
                       SELECT COUNT(*) FROM ticks a, ticks b, ticks c;
                   END"#,
            ] {
                sqlx::query(sql).execute(&mut *conn).await.unwrap();
            }
        }

        let batch: Vec<Product> = (1..=5)
            .map(|i| Product::new(i, i.to_string(), f64::from(i) * 10.0, "all"))
            .collect();
        let err = repo.create_batch(&batch).await.unwrap_err();

        assert_statement_cancelled(&err, "ProductRepository::create_batch");
        assert_eq!(pool.checked_out(), 0);

        let started = Instant::now();
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(pool.checked_out(), 0);
    }

    #[tokio::test]
    async fn test_column_read_fault_is_storage_error() {
        let (pool, repo) = setup().await;
        {
            let mut conn = pool.acquire("corrupt").await.unwrap();
            sqlx::query("INSERT INTO products (id, good, price, category_name) VALUES (1, 'x', 'not a price', 'all')")
                .execute(&mut *conn)
                .await
                .unwrap();
        }

        let err = repo.get_all().await.unwrap_err();

        assert_eq!(
            err.details().as_deref(),
            Some("ProductRepository::get_all: column read failed")
        );
    }
}

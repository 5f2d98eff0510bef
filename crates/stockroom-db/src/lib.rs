//! # stockroom-db: Database Layer for Stockroom
//!
//! This crate provides access to the `products` table through a bounded
//! connection pool, using sqlx over SQLite.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  Consumer (stockroom-cli list)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────┐   ┌───────────────────┐   ┌────────────┐  │   │
//! │  │   │ ConnectionPool │   │ ProductRepository │   │   schema   │  │   │
//! │  │   │   (pool.rs)    │◄──│   (product.rs)    │   │ bootstrap  │  │   │
//! │  │   │ acquire/release│   │ CRUD + bulk ops   │   │            │  │   │
//! │  │   └────────────────┘   └───────────────────┘   └────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, scoped handles, deadlines
//! - [`schema`] - Idempotent table bootstrap
//! - [`error`] - Driver fault classification
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{schema, ConnectionPool, PoolConfig};
//!
//! let pool = ConnectionPool::connect(PoolConfig::new("sqlite://./stockroom.db")).await?;
//! schema::bootstrap(&pool).await?;
//!
//! let products = pool.products().get_all().await?;
//! ```
//!
//! Connections are checked out only by the repository and the bootstrap:
//!
//! ```rust,compile_fail
//! async fn sneak(pool: &stockroom_db::ConnectionPool) {
//!     let _conn = pool.acquire("outside").await;
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod pool;
pub mod repository;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreFault, StoreResult};
pub use pool::{ConnectionPool, PoolConfig, PoolStatus};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;

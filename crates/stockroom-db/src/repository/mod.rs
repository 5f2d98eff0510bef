//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Consumer (CLI, UI table)                                              │
//! │       │                                                                 │
//! │       │  repo.get_all()                                                 │
//! │       ▼                                                                 │
//! │  ProductRepository ── holds a ConnectionPool (injected)                │
//! │  ├── get_all / get_by_id / get_most_expensive                          │
//! │  ├── get_products_with_price_range                                     │
//! │  ├── create / create_batch / update                                    │
//! │  ├── increase_category_price                                           │
//! │  └── delete / delete_all_category_products / truncate                  │
//! │       │                                                                 │
//! │       │  SQL statement                                                  │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and bulk updates

pub mod product;

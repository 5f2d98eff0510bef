//! # stockroom-core: Pure Types for Stockroom
//!
//! This crate contains the domain types shared by the repository and its
//! consumers, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Consumer (CLI table / UI table)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockroom-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   error   │  │  config   │  │ validation│  │   │
//! │  │   │  Product  │  │Classified │  │StoreConfig│  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockroom-db (Database Layer)                   │   │
//! │  │          Connection pool, schema bootstrap, repository          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - The `Product` entity
//! - [`error`] - Classified failure taxonomy
//! - [`config`] - Startup parameter parsing
//! - [`validation`] - Input validation

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::StoreConfig;
pub use error::{BoxError, CancelStage, ClassifiedError, CoreResult, ValidationError};
pub use types::Product;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default ceiling on concurrently open store connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

//! # Domain Types
//!
//! The single flat entity managed by Stockroom.
//!
//! ## Product Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         products                                        │
//! │                                                                         │
//! │   id (int, PK)   good (text)      price (real)   category_name (text)  │
//! │   ────────────   ──────────────   ────────────   ──────────────────    │
//! │   1              Samsung QLED     499.0          tv                    │
//! │   2              Dyson V11        349.5          appliances            │
//! │                                                                         │
//! │   id is assigned by the caller; uniqueness is enforced by the store.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::validate_product;

// =============================================================================
// Product
// =============================================================================

/// A product record.
///
/// Immutable value: an "update" replaces the stored row with another
/// product's fields. Equality is structural over all four fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Primary key, assigned by the caller.
    pub id: i32,

    /// Item name.
    pub good: String,

    /// Unit price, never negative.
    pub price: f64,

    /// Category the product belongs to.
    pub category_name: String,
}

impl Product {
    /// Creates a product without validating its fields.
    ///
    /// Used when reconstructing rows read back from the store.
    pub fn new(
        id: i32,
        good: impl Into<String>,
        price: f64,
        category_name: impl Into<String>,
    ) -> Self {
        Product {
            id,
            good: good.into(),
            price,
            category_name: category_name.into(),
        }
    }

    /// Creates a product from user input, checking every field.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::Product;
    ///
    /// assert!(Product::validated(1, "Samsung QLED", 499.0, "tv").is_ok());
    /// assert!(Product::validated(1, "", 499.0, "tv").is_err());
    /// ```
    pub fn validated(
        id: i32,
        good: impl Into<String>,
        price: f64,
        category_name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let product = Product::new(id, good, price, category_name);
        validate_product(&product)?;
        Ok(product)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = Product::new(1, "tv", 10.0, "all");
        let b = Product::new(1, "tv", 10.0, "all");
        assert_eq!(a, b);

        let c = Product::new(1, "tv", 10.5, "all");
        assert_ne!(a, c);
    }

    #[test]
    fn test_validated_rejects_negative_price() {
        let err = Product::validated(1, "tv", -1.0, "all").unwrap_err();
        assert_eq!(
            err,
            ValidationError::Negative {
                field: "price".to_string()
            }
        );
    }

    #[test]
    fn test_serializes_camel_case() {
        let product = Product::new(7, "kettle", 25.0, "kitchen");
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["categoryName"], "kitchen");
        assert_eq!(json["id"], 7);
    }
}

//! # Validation Module
//!
//! Input validation for user-entered products.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI / consumer                                               │
//! │  └── THIS MODULE: field checks before calling the repository           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: ProductRepository                                            │
//! │  └── No validation, the store is the authority                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database                                                     │
//! │  ├── NOT NULL constraints                                              │
//! │  └── PRIMARY KEY uniqueness                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_percent, validate_text};
//!
//! validate_text("good", "Samsung QLED").unwrap();
//! validate_percent(0.5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::Product;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required text field (non-empty after trimming).
pub fn validate_text(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Parses a product id from user input.
pub fn parse_id(value: &str) -> ValidationResult<i32> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "id".to_string(),
            reason: format!("'{value}' is not an integer"),
        })
}

/// Parses a real number from user input.
pub fn parse_number(field: &str, value: &str) -> ValidationResult<f64> {
    let number: f64 = value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("'{value}' is not a number"),
        })?;

    if !number.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }

    Ok(number)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price.
///
/// ## Rules
/// - Must be finite
/// - Must be non-negative (zero is allowed)
pub fn validate_price(price: f64) -> ValidationResult<()> {
    if !price.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "price".to_string(),
        });
    }

    if price < 0.0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a price adjustment factor.
///
/// The factor multiplies and adds (`price += price * percent`), so `0.5`
/// raises a price by half. Negative factors lower prices and are allowed.
pub fn validate_percent(percent: f64) -> ValidationResult<()> {
    if !percent.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "percent".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates every field of a product.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_text("good", &product.good)?;
    validate_price(product.price)?;
    validate_text("category_name", &product.category_name)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

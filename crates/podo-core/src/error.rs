//! # Error Types
//!
//! Domain-specific error types for podo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  podo-core errors (this file)                                          │
//! │  ├── CoreError        - Ledger rule violations, missing records        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  podo-db errors (separate crate)                                       │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An unknown condition tag is NOT an error: the split falls back to 50/50.
//! Everything structural (a missing id, a second refund) is a typed variant.

use thiserror::Error;

use crate::types::ItemCategory;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// No sale with this id in the log.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// No item with this id in the book or goods collection.
    #[error("{category} not found: {id}")]
    ItemNotFound { category: ItemCategory, id: String },

    /// A sale, settlement or stats query referenced a missing owner.
    #[error("Owner not found: {0}")]
    OwnerNotFound(String),

    /// The sale was already refunded. Refunded is terminal.
    ///
    /// ## User Workflow
    /// ```text
    /// refund(SL-1) ──► Completed → Refunded ✓
    /// refund(SL-1) ──► AlreadyRefunded (nothing changes)
    /// ```
    #[error("Sale {0} is already refunded")]
    AlreadyRefunded(String),

    /// The item a sale points at no longer exists, so a refund cannot
    /// restore its stock. The refund is aborted as a whole.
    #[error("Sale {sale_id} references missing {category} {item_id}")]
    InventoryInconsistency {
        sale_id: String,
        category: ItemCategory,
        item_id: String,
    },

    /// The item is already sold out.
    #[error("{category} {id} is sold out")]
    ItemSoldOut { category: ItemCategory, id: String },

    /// A settlement for this owner and period already exists.
    #[error("Settlement for owner {owner_id} in {period} already closed")]
    PeriodAlreadySettled { owner_id: String, period: String },

    /// The month has not ended yet, so sales can still land in it.
    #[error("Settlement period {period} is still open")]
    PeriodStillOpen { period: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for "the thing you asked for does not exist" variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::SaleNotFound(_) | CoreError::ItemNotFound { .. } | CoreError::OwnerNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. a malformed period key).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::ItemNotFound {
            category: ItemCategory::Book,
            id: "BK001".to_string(),
        };
        assert_eq!(err.to_string(), "book not found: BK001");

        let err = CoreError::AlreadyRefunded("SL001".to_string());
        assert_eq!(err.to_string(), "Sale SL001 is already refunded");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "price".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: price must be positive");
    }

    #[test]
    fn test_not_found_classification() {
        assert!(CoreError::SaleNotFound("x".into()).is_not_found());
        assert!(CoreError::OwnerNotFound("x".into()).is_not_found());
        assert!(!CoreError::AlreadyRefunded("x".into()).is_not_found());
    }
}

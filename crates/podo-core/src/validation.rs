//! # Validation Module
//!
//! Input checks for catalog intake and owner registration.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization                                              │
//! │  └── Enum tags, period keys, money as integers                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Prices positive, names present                                    │
//! │  └── Branch codes and owner numbers well-formed                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Ledger rules (CoreError)                                     │
//! │  └── Sold out, already refunded, period already settled                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Condition tags are deliberately NOT validated: unknown tags are a
//! priced case (50/50), not bad input.

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Item;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Codes
// =============================================================================

/// Validates a branch code: two ASCII uppercase letters (`MP`, `GH`).
pub fn validate_branch_code(code: &str) -> ValidationResult<()> {
    if code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "branch code".to_string(),
        });
    }

    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "branch code".to_string(),
            reason: "must be two uppercase letters".to_string(),
        });
    }

    Ok(())
}

/// Validates an owner number: branch code followed by three digits.
///
/// ## Example
/// ```rust
/// use podo_core::validation::validate_owner_number;
///
/// assert!(validate_owner_number("MP001").is_ok());
/// assert!(validate_owner_number("MP1").is_err());
/// ```
pub fn validate_owner_number(number: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: "owner number".to_string(),
        reason: "must look like MP001".to_string(),
    };

    if number.len() != 5 || !number.is_ascii() {
        return Err(invalid());
    }
    let (code, seq) = number.split_at(2);
    validate_branch_code(code).map_err(|_| invalid())?;
    if !seq.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    Ok(())
}

/// Next free owner number for a branch.
///
/// Takes the highest sequence already used under `branch_code` and adds one.
/// Numbers from other branches and malformed numbers are ignored.
///
/// ## Example
/// ```rust
/// use podo_core::validation::next_owner_number;
///
/// let existing = ["MP001", "MP003", "GH001"];
/// assert_eq!(next_owner_number("MP", existing).unwrap(), "MP004");
/// assert_eq!(next_owner_number("GJ", existing).unwrap(), "GJ001");
/// ```
pub fn next_owner_number<'a, I>(branch_code: &str, existing: I) -> ValidationResult<String>
where
    I: IntoIterator<Item = &'a str>,
{
    validate_branch_code(branch_code)?;

    let highest = existing
        .into_iter()
        .filter(|n| validate_owner_number(n).is_ok())
        .filter_map(|n| n.strip_prefix(branch_code))
        .filter_map(|seq| seq.parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    if highest >= 999 {
        return Err(ValidationError::OutOfRange {
            field: "owner sequence".to_string(),
            min: 1,
            max: 999,
        });
    }

    Ok(format!("{}{:03}", branch_code, highest + 1))
}

// =============================================================================
// Catalog
// =============================================================================

/// Validates a selling price. Items are never free.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Validates an item before it enters the catalog.
///
/// ## Rules
/// - id, branch and title/name present
/// - price positive
/// - an owned item carries a well-formed owner number
pub fn validate_item(item: &Item) -> ValidationResult<()> {
    for (field, value) in [("id", item.id.as_str()), ("branch", item.branch_id.as_str()), ("title", item.title())] {
        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }
    }

    validate_price(item.price)?;

    if item.owner_id.is_some() {
        validate_owner_number(&item.owner_number)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_validate_branch_code() {
        assert!(validate_branch_code("MP").is_ok());
        assert!(validate_branch_code("").is_err());
        assert!(validate_branch_code("mp").is_err());
        assert!(validate_branch_code("MPO").is_err());
    }

    #[test]
    fn test_validate_owner_number() {
        assert!(validate_owner_number("GH001").is_ok());
        assert!(validate_owner_number("GH01").is_err());
        assert!(validate_owner_number("gh001").is_err());
        assert!(validate_owner_number("GH0A1").is_err());
    }

    #[test]
    fn test_next_owner_number() {
        assert_eq!(next_owner_number("MP", Vec::new()).unwrap(), "MP001");
        assert_eq!(
            next_owner_number("MP", ["MP001", "MP002", "garbage", "GH009"]).unwrap(),
            "MP003"
        );
        assert!(next_owner_number("MP", ["MP999"]).is_err());
        assert!(next_owner_number("m", Vec::new()).is_err());
    }

    #[test]
    fn test_validate_item() {
        let ok = Item::goods("GD1", "BR001", "Mug", Money::won(5_000), "collab", Utc::now());
        assert!(validate_item(&ok).is_ok());

        let free = Item { price: Money::zero(), ..ok.clone() };
        assert!(matches!(validate_item(&free), Err(ValidationError::MustBePositive { .. })));

        let nameless = Item::goods("GD1", "BR001", " ", Money::won(5_000), "collab", Utc::now());
        assert!(matches!(validate_item(&nameless), Err(ValidationError::Required { .. })));

        let bad_owner = ok.owned_by("OW001", "001");
        assert!(validate_item(&bad_owner).is_err());
    }
}

//! # Validation Module
//!
//! Business-rule validation run before anything touches the store. The
//! native numeric inputs on the tender screens accept whatever is typed;
//! these are the checks that actually hold the line.

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::MAX_LINE_QUANTITY;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a consumption line quantity.
///
/// ## Rules
/// - Must be positive (> 0): zero or negative lines are removals, not edits
/// - Must not exceed `MAX_LINE_QUANTITY`
///
/// ## Example
/// ```rust
/// use cabina_core::validation::validate_quantity;
///
/// assert!(validate_quantity(3).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(-2).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a tendered or posted amount: must be strictly positive.
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a tender component (cash/yape/plin/advance): zero is fine,
/// negative is not.
pub fn validate_tender_component(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an abono against the debt it posts to.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed the remaining balance (a larger abono would drive
///   the balance negative; the surplus belongs in the drawer as change)
pub fn validate_debt_payment(amount: Money, remaining: Money) -> ValidationResult<()> {
    validate_amount("payment amount", amount)?;

    if amount > remaining {
        return Err(ValidationError::ExceedsBalance {
            requested: amount,
            remaining,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a client name.
pub fn validate_client_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 120 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 120,
        });
    }

    Ok(())
}

/// Validates a movement/abono detail text.
pub fn validate_detail(detail: &str) -> ValidationResult<()> {
    if detail.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "detail".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("amount", Money::from_cents(100)).is_ok());
        assert!(validate_amount("amount", Money::zero()).is_err());
        assert!(validate_amount("amount", Money::from_cents(-100)).is_err());
    }

    #[test]
    fn test_validate_tender_component_allows_zero() {
        assert!(validate_tender_component("yape", Money::zero()).is_ok());
        assert!(validate_tender_component("yape", Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_debt_payment_bounds() {
        let remaining = Money::from_cents(500);
        assert!(validate_debt_payment(Money::from_cents(500), remaining).is_ok());
        assert!(validate_debt_payment(Money::from_cents(100), remaining).is_ok());

        assert!(validate_debt_payment(Money::zero(), remaining).is_err());
        assert!(matches!(
            validate_debt_payment(Money::from_cents(501), remaining),
            Err(ValidationError::ExceedsBalance { .. })
        ));
    }

    #[test]
    fn test_validate_client_name() {
        assert!(validate_client_name("María Quispe").is_ok());
        assert!(validate_client_name("").is_err());
        assert!(validate_client_name("   ").is_err());
        assert!(validate_client_name(&"x".repeat(200)).is_err());
    }
}

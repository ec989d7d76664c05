//! Pre-flight checks for grocery input. A failure here never reaches the
//! network.

use thiserror::Error;

use crate::types::NewGroceryItem;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Item name cannot be empty.")]
    EmptyName,
    #[error("Invalid quantity {0:?}. Must be a positive number.")]
    InvalidQuantity(String),
    #[error("Quantity must be at least 1.")]
    NonPositiveQuantity,
}

/// Returns the trimmed name.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

pub fn validate_quantity(quantity: u32) -> Result<u32, ValidationError> {
    if quantity == 0 {
        return Err(ValidationError::NonPositiveQuantity);
    }
    Ok(quantity)
}

/// The whole trimmed input must be an integer; `"3x"` is rejected rather than
/// read as 3.
pub fn parse_quantity(input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();
    match trimmed.parse::<i64>() {
        Ok(n) if n <= 0 => Err(ValidationError::NonPositiveQuantity),
        Ok(n) => u32::try_from(n).map_err(|_| ValidationError::InvalidQuantity(trimmed.to_string())),
        Err(_) => Err(ValidationError::InvalidQuantity(trimmed.to_string())),
    }
}

pub fn validate_draft(name: &str, quantity: &str) -> Result<NewGroceryItem, ValidationError> {
    Ok(NewGroceryItem {
        name: validate_name(name)?,
        quantity: parse_quantity(quantity)?,
    })
}

/// Re-check an already-typed draft, normalizing the name.
pub(crate) fn check_draft(draft: &NewGroceryItem) -> Result<NewGroceryItem, ValidationError> {
    Ok(NewGroceryItem {
        name: validate_name(&draft.name)?,
        quantity: validate_quantity(draft.quantity)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed() {
        assert_eq!(validate_name("  Bread ").unwrap(), "Bread");
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(validate_name(" \t"), Err(ValidationError::EmptyName));
    }

    #[test]
    fn quantity_must_be_positive_integer() {
        assert_eq!(parse_quantity(" 4 ").unwrap(), 4);
        assert_eq!(parse_quantity("0"), Err(ValidationError::NonPositiveQuantity));
        assert_eq!(parse_quantity("-1"), Err(ValidationError::NonPositiveQuantity));
        assert!(matches!(parse_quantity("abc"), Err(ValidationError::InvalidQuantity(_))));
        assert!(matches!(parse_quantity("3x"), Err(ValidationError::InvalidQuantity(_))));
        assert!(matches!(parse_quantity("2.5"), Err(ValidationError::InvalidQuantity(_))));
        assert!(matches!(
            parse_quantity("99999999999"),
            Err(ValidationError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn draft_combines_both_checks() {
        let draft = validate_draft(" Apples ", "3").unwrap();
        assert_eq!(
            draft,
            NewGroceryItem {
                name: "Apples".to_string(),
                quantity: 3
            }
        );
        assert_eq!(validate_draft("", "3"), Err(ValidationError::EmptyName));
    }
}

//! Validation utilities

use crate::types::*;

/// Validate that a token amount is non-negative
pub fn validate_non_negative(amount: i64, what: &str) -> LedgerResult<()> {
    if amount < 0 {
        Err(LedgerError::Validation(format!(
            "{what} cannot be negative: {amount}"
        )))
    } else {
        Ok(())
    }
}

/// Validate that a document id is usable
pub fn validate_id(id: &str) -> LedgerResult<()> {
    if id.trim().is_empty() {
        return Err(LedgerError::Validation("id cannot be empty".to_string()));
    }

    if id.len() > 64 {
        return Err(LedgerError::Validation(
            "id cannot exceed 64 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate a display name, title, or fine reason
pub fn validate_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_a_valid_amount() {
        assert!(validate_non_negative(0, "price").is_ok());
        assert!(validate_non_negative(-1, "price").is_err());
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(validate_name("  ").is_err());
        assert!(validate_name("Clean room").is_ok());
    }
}

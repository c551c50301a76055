//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a name field holds at least one non-whitespace character.
///
/// # Examples
///
/// ```ignore
/// validate_non_blank("Red Team") // Ok
/// validate_non_blank("   ")      // Err - whitespace only
/// validate_non_blank("")         // Err - empty
/// ```
pub fn validate_non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("non_blank");
        err.message = Some("must not be empty or whitespace-only".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_blank_valid() {
        assert!(validate_non_blank("Red Team").is_ok());
        assert!(validate_non_blank("x").is_ok());
        assert!(validate_non_blank("  padded  ").is_ok());
    }

    #[test]
    fn test_validate_non_blank_invalid() {
        assert!(validate_non_blank("").is_err());
        assert!(validate_non_blank(" ").is_err());
        assert!(validate_non_blank("\t\n").is_err());
    }
}

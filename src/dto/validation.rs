//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted participant or room identifier.
const MAX_IDENTITY_LEN: usize = 128;

/// Validates a connection identity component (participant id or room id).
///
/// Identifiers must be non-empty, at most 128 characters, and free of
/// whitespace and control characters, since they are embedded in composite
/// invite ids and log lines.
pub fn validate_identity(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        let mut err = ValidationError::new("identity_empty");
        err.message = Some("identifier must not be empty".into());
        return Err(err);
    }

    if value.len() > MAX_IDENTITY_LEN {
        let mut err = ValidationError::new("identity_length");
        err.message = Some(
            format!(
                "identifier must be at most {MAX_IDENTITY_LEN} characters (got {})",
                value.len()
            )
            .into(),
        );
        return Err(err);
    }

    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        let mut err = ValidationError::new("identity_format");
        err.message = Some("identifier must not contain whitespace or control characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identity_valid() {
        assert!(validate_identity("alice").is_ok());
        assert!(validate_identity("room-42").is_ok());
        assert!(validate_identity("u_9f8e7d6c").is_ok());
    }

    #[test]
    fn test_validate_identity_empty_or_too_long() {
        assert!(validate_identity("").is_err());
        assert!(validate_identity(&"x".repeat(MAX_IDENTITY_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_identity_invalid_characters() {
        assert!(validate_identity("alice bob").is_err()); // space
        assert!(validate_identity("alice\n").is_err()); // newline
        assert!(validate_identity("tab\there").is_err()); // tab
    }
}

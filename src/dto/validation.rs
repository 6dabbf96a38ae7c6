//! Validation helpers for DTOs.

use validator::ValidationError;

/// Shortest accepted player or voter name after trimming.
pub const MIN_NAME_LEN: usize = 2;

/// Validates that a join code is exactly 6 alphanumeric characters.
///
/// Codes are matched case-insensitively; normalization to uppercase happens
/// in the service layer, not here.
pub fn validate_group_code(code: &str) -> Result<(), ValidationError> {
    let trimmed = code.trim();
    if trimmed.len() != 6 {
        let mut err = ValidationError::new("group_code_length");
        err.message = Some(
            format!(
                "Join code must be exactly 6 characters (got {})",
                trimmed.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("group_code_format");
        err.message = Some("Join code must contain only letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a name survives trimming with at least [`MIN_NAME_LEN`] characters.
pub fn validate_trimmed_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() < MIN_NAME_LEN {
        let mut err = ValidationError::new("name_too_short");
        err.message =
            Some(format!("Name must be at least {MIN_NAME_LEN} characters after trimming").into());
        return Err(err);
    }
    Ok(())
}

/// Canonical form of a voter name: trimmed and lowercased.
///
/// Returns `None` when the normalized name is shorter than [`MIN_NAME_LEN`],
/// so " Bob ", "bob" and "BOB" all collapse to the same ballot key.
pub fn normalize_voter_name(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_lowercase();
    if normalized.chars().count() < MIN_NAME_LEN {
        return None;
    }
    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_group_code_valid() {
        assert!(validate_group_code("ABC123").is_ok());
        assert!(validate_group_code("abc123").is_ok());
        assert!(validate_group_code(" XYZ789 ").is_ok()); // trimmed before checking
    }

    #[test]
    fn test_validate_group_code_invalid() {
        assert!(validate_group_code("ABC12").is_err()); // too short
        assert!(validate_group_code("ABC1234").is_err()); // too long
        assert!(validate_group_code("ABC 12").is_err()); // inner space
        assert!(validate_group_code("ABC-12").is_err()); // punctuation
        assert!(validate_group_code("").is_err());
    }

    #[test]
    fn test_validate_trimmed_name() {
        assert!(validate_trimmed_name("Bo").is_ok());
        assert!(validate_trimmed_name("  Bob  ").is_ok());
        assert!(validate_trimmed_name("B").is_err());
        assert!(validate_trimmed_name("   ").is_err());
    }

    #[test]
    fn test_normalize_voter_name_collapses_casing_and_whitespace() {
        assert_eq!(normalize_voter_name(" Bob "), Some("bob".into()));
        assert_eq!(normalize_voter_name("BOB"), Some("bob".into()));
        assert_eq!(normalize_voter_name("bob"), Some("bob".into()));
    }

    #[test]
    fn test_normalize_voter_name_rejects_short_names() {
        assert_eq!(normalize_voter_name(" b "), None);
        assert_eq!(normalize_voter_name(""), None);
        assert_eq!(normalize_voter_name("   "), None);
    }
}

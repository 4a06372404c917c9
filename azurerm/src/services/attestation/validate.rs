//! Validation functions for Attestation.

use std::sync::Arc;
use tfkit::schema::Validator;
use tfkit::validator::StringPatternValidator;

/// Attestation provider names are 3-24 alphanumeric characters.
pub fn attestation_provider_name() -> Arc<dyn Validator> {
    StringPatternValidator::new(
        r"^[a-zA-Z0-9]{3,24}$",
        "attestation provider names must be 3-24 alphanumeric characters",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfkit::types::{AttributePath, Dynamic};

    fn is_valid(name: &str) -> bool {
        let mut diags = Vec::new();
        attestation_provider_name().validate(
            &Dynamic::String(name.to_string()),
            &AttributePath::new("name"),
            &mut diags,
        );
        diags.is_empty()
    }

    #[test]
    fn accepts_alphanumeric_names() {
        assert!(is_valid("attestor1"));
        assert!(is_valid("Abc"));
        assert!(is_valid("a".repeat(24).as_str()));
    }

    #[test]
    fn rejects_bad_names() {
        assert!(!is_valid("ab")); // too short
        assert!(!is_valid(&"a".repeat(25))); // too long
        assert!(!is_valid("has-hyphen"));
        assert!(!is_valid("has space"));
    }
}

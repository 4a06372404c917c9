//! Validation functions for Azure Firewall.

use std::sync::Arc;
use tfkit::schema::Validator;
use tfkit::validator::{NumberRangeValidator, StringPatternValidator};

/// Firewall and rule collection names: start alphanumeric, end alphanumeric
/// or underscore, with hyphens, periods and underscores in the middle.
pub fn firewall_name() -> Arc<dyn Validator> {
    StringPatternValidator::new(
        r"^[a-zA-Z0-9][a-zA-Z0-9._-]{0,78}[a-zA-Z0-9_]$",
        "names must begin with a letter or digit, end with a letter, digit or underscore, and may contain only letters, digits, hyphens, periods and underscores",
    )
}

/// Rule collection priorities.
pub fn rule_collection_priority() -> Arc<dyn Validator> {
    NumberRangeValidator::between(100.0, 65000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfkit::types::{AttributePath, Dynamic};

    fn ok(validator: Arc<dyn Validator>, value: Dynamic) -> bool {
        let mut diags = Vec::new();
        validator.validate(&value, &AttributePath::new("x"), &mut diags);
        diags.is_empty()
    }

    #[test]
    fn firewall_name_rules() {
        assert!(ok(firewall_name(), Dynamic::String("fw-prod-01".into())));
        assert!(ok(firewall_name(), Dynamic::String("fw_1".into())));
        assert!(!ok(firewall_name(), Dynamic::String("-fw".into())));
        assert!(!ok(firewall_name(), Dynamic::String("fw-".into())));
    }

    #[test]
    fn priority_range() {
        assert!(ok(rule_collection_priority(), Dynamic::Number(100.0)));
        assert!(ok(rule_collection_priority(), Dynamic::Number(65000.0)));
        assert!(!ok(rule_collection_priority(), Dynamic::Number(99.0)));
        assert!(!ok(rule_collection_priority(), Dynamic::Number(65001.0)));
    }
}

//! Validation functions for Analysis Services.

use std::sync::Arc;
use tfkit::schema::Validator;
use tfkit::validator::{OneOfValidator, StringPatternValidator};

/// Server names are 3-63 characters, lowercase letters and digits, and must
/// lead with a letter.
pub fn server_name() -> Arc<dyn Validator> {
    StringPatternValidator::new(
        r"^[a-z][a-z0-9]{2,62}$",
        "server names must start with a lowercase letter and be 3-63 lowercase alphanumeric characters",
    )
}

pub fn sku_name() -> Arc<dyn Validator> {
    OneOfValidator::new(&[
        "D1", "B1", "B2", "S0", "S1", "S2", "S4", "S8", "S9", "S8v2", "S9v2",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfkit::types::{AttributePath, Dynamic};

    fn run(validator: Arc<dyn Validator>, value: &str) -> bool {
        let mut diags = Vec::new();
        validator.validate(
            &Dynamic::String(value.to_string()),
            &AttributePath::new("x"),
            &mut diags,
        );
        diags.is_empty()
    }

    #[test]
    fn server_name_rules() {
        assert!(run(server_name(), "analysis1"));
        assert!(!run(server_name(), "1analysis"));
        assert!(!run(server_name(), "Analysis"));
        assert!(!run(server_name(), "ab"));
    }

    #[test]
    fn sku_allows_known_tiers_only() {
        assert!(run(sku_name(), "S1"));
        assert!(run(sku_name(), "S9v2"));
        assert!(!run(sku_name(), "S3"));
    }
}

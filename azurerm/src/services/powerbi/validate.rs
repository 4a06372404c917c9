//! Validation functions for Power BI Embedded.

use std::sync::Arc;
use tfkit::schema::Validator;
use tfkit::validator::{OneOfValidator, StringPatternValidator};

pub fn capacity_name() -> Arc<dyn Validator> {
    StringPatternValidator::new(
        r"^[a-z][a-z0-9]{2,62}$",
        "capacity names must start with a lowercase letter and be 3-63 lowercase alphanumeric characters",
    )
}

pub fn sku_name() -> Arc<dyn Validator> {
    OneOfValidator::new(&["A1", "A2", "A3", "A4", "A5", "A6"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfkit::types::{AttributePath, Dynamic};

    fn ok(validator: Arc<dyn Validator>, value: &str) -> bool {
        let mut diags = Vec::new();
        validator.validate(
            &Dynamic::String(value.to_string()),
            &AttributePath::new("x"),
            &mut diags,
        );
        diags.is_empty()
    }

    #[test]
    fn capacity_name_rules() {
        assert!(ok(capacity_name(), "pbiembedded1"));
        assert!(!ok(capacity_name(), "PBI"));
        assert!(!ok(capacity_name(), "1pbi"));
    }

    #[test]
    fn sku_rules() {
        assert!(ok(sku_name(), "A4"));
        assert!(!ok(sku_name(), "A7"));
        assert!(!ok(sku_name(), "S1"));
    }
}

//! Stock validators for schema attributes.

use crate::schema::Validator;
use crate::types::{AttributePath, Diagnostic, Dynamic};
use std::sync::Arc;

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl StringLengthValidator {
    pub fn between(min: usize, max: usize) -> Arc<dyn Validator> {
        Arc::new(Self {
            min: Some(min),
            max: Some(max),
        })
    }
}

impl Validator for StringLengthValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("string length between {} and {}", min, max),
            (Some(min), None) => format!("string length at least {}", min),
            (None, Some(max)) => format!("string length at most {}", max),
            (None, None) => "any string".to_string(),
        }
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Dynamic::String(s) = value else { return };

        if let Some(min) = self.min {
            if s.chars().count() < min {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid attribute value length",
                        format!("expected {}, got length {}", self.description(), s.len()),
                    )
                    .with_attribute(path.clone()),
                );
                return;
            }
        }
        if let Some(max) = self.max {
            if s.chars().count() > max {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid attribute value length",
                        format!("expected {}, got length {}", self.description(), s.len()),
                    )
                    .with_attribute(path.clone()),
                );
            }
        }
    }
}

pub struct StringPatternValidator {
    pub pattern: regex::Regex,
    pub description: String,
}

impl StringPatternValidator {
    /// Panics on an invalid pattern; validators are built from literals at
    /// schema-construction time.
    pub fn new(pattern: &str, description: &str) -> Arc<dyn Validator> {
        Arc::new(Self {
            pattern: regex::Regex::new(pattern).expect("invalid validator pattern"),
            description: description.to_string(),
        })
    }
}

impl Validator for StringPatternValidator {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Dynamic::String(s) = value else { return };

        if !self.pattern.is_match(s) {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid attribute value",
                    format!("\"{}\" does not match {}", s, self.description),
                )
                .with_attribute(path.clone()),
            );
        }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRangeValidator {
    pub fn between(min: f64, max: f64) -> Arc<dyn Validator> {
        Arc::new(Self {
            min: Some(min),
            max: Some(max),
        })
    }
}

impl Validator for NumberRangeValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("number between {} and {}", min, max),
            (Some(min), None) => format!("number at least {}", min),
            (None, Some(max)) => format!("number at most {}", max),
            (None, None) => "any number".to_string(),
        }
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Dynamic::Number(n) = value else { return };

        let out_of_range = self.min.is_some_and(|min| *n < min) || self.max.is_some_and(|max| *n > max);
        if out_of_range {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid attribute value",
                    format!("expected {}, got {}", self.description(), n),
                )
                .with_attribute(path.clone()),
            );
        }
    }
}

pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for ListLengthValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("between {} and {} items", min, max),
            (Some(min), None) => format!("at least {} items", min),
            (None, Some(max)) => format!("at most {} items", max),
            (None, None) => "any number of items".to_string(),
        }
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Dynamic::List(items) = value else { return };

        let out_of_range =
            self.min.is_some_and(|min| items.len() < min) || self.max.is_some_and(|max| items.len() > max);
        if out_of_range {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid attribute value length",
                    format!("expected {}, got {} items", self.description(), items.len()),
                )
                .with_attribute(path.clone()),
            );
        }
    }
}

/// Accepts only values from a fixed set of strings.
pub struct OneOfValidator {
    pub allowed: Vec<String>,
}

impl OneOfValidator {
    pub fn new(allowed: &[&str]) -> Arc<dyn Validator> {
        Arc::new(Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl Validator for OneOfValidator {
    fn description(&self) -> String {
        format!("one of [{}]", self.allowed.join(", "))
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Dynamic::String(s) = value else { return };

        if !self.allowed.iter().any(|a| a == s) {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid attribute value",
                    format!("expected {}, got \"{}\"", self.description(), s),
                )
                .with_attribute(path.clone()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(validator: &dyn Validator, value: Dynamic) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        validator.validate(&value, &AttributePath::new("field"), &mut diags);
        diags
    }

    #[test]
    fn string_length_bounds() {
        let v = StringLengthValidator {
            min: Some(3),
            max: Some(5),
        };
        assert!(run(&v, Dynamic::String("abcd".into())).is_empty());
        assert_eq!(run(&v, Dynamic::String("ab".into())).len(), 1);
        assert_eq!(run(&v, Dynamic::String("abcdef".into())).len(), 1);
    }

    #[test]
    fn string_length_ignores_non_strings() {
        let v = StringLengthValidator {
            min: Some(3),
            max: None,
        };
        assert!(run(&v, Dynamic::Number(1.0)).is_empty());
    }

    #[test]
    fn pattern_rejects_non_matching() {
        let v = StringPatternValidator {
            pattern: regex::Regex::new(r"^[a-z][a-z0-9]{2,62}$").unwrap(),
            description: "lowercase alphanumeric, starting with a letter".to_string(),
        };
        assert!(run(&v, Dynamic::String("analysis1".into())).is_empty());

        let diags = run(&v, Dynamic::String("1bad".into()));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.contains("lowercase alphanumeric"));
    }

    #[test]
    fn number_range_bounds() {
        let v = NumberRangeValidator {
            min: Some(100.0),
            max: Some(65000.0),
        };
        assert!(run(&v, Dynamic::Number(8080.0)).is_empty());
        assert_eq!(run(&v, Dynamic::Number(1.0)).len(), 1);
    }

    #[test]
    fn list_length_bounds() {
        let v = ListLengthValidator {
            min: Some(1),
            max: Some(2),
        };
        assert!(run(&v, Dynamic::List(vec![Dynamic::Bool(true)])).is_empty());
        assert_eq!(run(&v, Dynamic::List(vec![])).len(), 1);
    }

    #[test]
    fn one_of_rejects_unknown_values() {
        let v = OneOfValidator {
            allowed: vec!["Alert".into(), "Deny".into(), "Off".into()],
        };
        assert!(run(&v, Dynamic::String("Deny".into())).is_empty());

        let diags = run(&v, Dynamic::String("Allow".into()));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.contains("one of [Alert, Deny, Off]"));
    }
}

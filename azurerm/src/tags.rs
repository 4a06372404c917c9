//! Tags expand/flatten and validation.

use std::collections::HashMap;
use std::sync::Arc;
use tfkit::schema::Validator;
use tfkit::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// Resource Manager limits, enforced client-side so a bad plan fails before
/// any API call.
const MAX_TAGS: usize = 50;
const MAX_KEY_LENGTH: usize = 512;
const MAX_VALUE_LENGTH: usize = 256;

/// Read the `tags` attribute from config into the API shape. Absent or
/// null tags expand to `None` so the field is omitted from the payload.
pub fn expand(config: &DynamicValue) -> Option<HashMap<String, String>> {
    let map = config.try_get_map(&AttributePath::new("tags"))?;

    Some(
        map.into_iter()
            .filter_map(|(k, v)| match v {
                Dynamic::String(s) => Some((k, s)),
                _ => None,
            })
            .collect(),
    )
}

/// Write API tags into state. Present-but-empty and absent both flatten to
/// an empty map so state stays stable across refreshes.
pub fn flatten(state: &mut DynamicValue, tags: Option<&HashMap<String, String>>) {
    let value: HashMap<String, Dynamic> = tags
        .map(|t| {
            t.iter()
                .map(|(k, v)| (k.clone(), Dynamic::String(v.clone())))
                .collect()
        })
        .unwrap_or_default();

    // State shape is schema-governed; this cannot fail on a map attribute.
    let _ = state.set_map(&AttributePath::new("tags"), value);
}

pub struct TagsValidator;

impl TagsValidator {
    pub fn shared() -> Arc<dyn Validator> {
        Arc::new(Self)
    }
}

impl Validator for TagsValidator {
    fn description(&self) -> String {
        format!(
            "at most {} tags, keys up to {} characters and values up to {}",
            MAX_TAGS, MAX_KEY_LENGTH, MAX_VALUE_LENGTH
        )
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Dynamic::Map(map) = value else { return };

        if map.len() > MAX_TAGS {
            diagnostics.push(
                Diagnostic::error(
                    "Too many tags",
                    format!("a maximum of {} tags can be applied, got {}", MAX_TAGS, map.len()),
                )
                .with_attribute(path.clone()),
            );
        }

        for (key, value) in map {
            if key.len() > MAX_KEY_LENGTH {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid tag key",
                        format!("the tag key {:?} exceeds {} characters", key, MAX_KEY_LENGTH),
                    )
                    .with_attribute(path.clone()),
                );
            }
            if let Dynamic::String(s) = value {
                if s.len() > MAX_VALUE_LENGTH {
                    diagnostics.push(
                        Diagnostic::error(
                            "Invalid tag value",
                            format!(
                                "the value of tag {:?} exceeds {} characters",
                                key, MAX_VALUE_LENGTH
                            ),
                        )
                        .with_attribute(path.clone()),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_reads_string_tags() {
        let mut config = DynamicValue::empty_object();
        config
            .set_map(
                &AttributePath::new("tags"),
                HashMap::from([("env".to_string(), Dynamic::String("prod".to_string()))]),
            )
            .unwrap();

        let tags = expand(&config).unwrap();
        assert_eq!(tags.get("env"), Some(&"prod".to_string()));
    }

    #[test]
    fn expand_absent_tags_is_none() {
        assert!(expand(&DynamicValue::empty_object()).is_none());
    }

    #[test]
    fn flatten_writes_empty_map_for_absent_tags() {
        let mut state = DynamicValue::empty_object();
        flatten(&mut state, None);
        assert!(state.get_map(&AttributePath::new("tags")).unwrap().is_empty());
    }

    #[test]
    fn validator_rejects_too_many_tags() {
        let map: HashMap<String, Dynamic> = (0..51)
            .map(|i| (format!("key{}", i), Dynamic::String("v".to_string())))
            .collect();

        let mut diags = Vec::new();
        TagsValidator.validate(&Dynamic::Map(map), &AttributePath::new("tags"), &mut diags);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.contains("Too many tags"));
    }

    #[test]
    fn validator_rejects_long_values() {
        let map = HashMap::from([(
            "key".to_string(),
            Dynamic::String("v".repeat(MAX_VALUE_LENGTH + 1)),
        )]);

        let mut diags = Vec::new();
        TagsValidator.validate(&Dynamic::Map(map), &AttributePath::new("tags"), &mut diags);
        assert_eq!(diags.len(), 1);
    }
}

//! Shared schema attributes and cross-service helpers.
//!
//! The counterparts of the Go provider's `commonschema` package: every
//! resource carries the same `name`/`location`/`resource_group_name`/`tags`
//! shapes, so they are declared once here.

use tfkit::schema::{Attribute, AttributeBuilder, AttributeType};
use tfkit::types::{Diagnostic, Dynamic};
use tfkit::validator::StringPatternValidator;

/// Azure treats "West Europe", "westeurope" and "WESTEUROPE" as the same
/// location; state always stores the normalized form.
pub fn normalize_location(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

pub fn id_attribute() -> Attribute {
    AttributeBuilder::new("id", AttributeType::String)
        .description("The resource ID")
        .computed()
        .build()
}

pub fn location_attribute() -> Attribute {
    AttributeBuilder::new("location", AttributeType::String)
        .description("The Azure region where the resource exists")
        .required()
        .force_new()
        .build()
}

pub fn resource_group_name_attribute() -> Attribute {
    AttributeBuilder::new("resource_group_name", AttributeType::String)
        .description("The name of the resource group in which to create the resource")
        .required()
        .force_new()
        .validator(StringPatternValidator::new(
            r"^[-\w\._\(\)]{1,90}$",
            "resource group names are up to 90 characters of letters, digits, hyphens, dots, underscores and parentheses",
        ))
        .build()
}

pub fn tags_attribute() -> Attribute {
    AttributeBuilder::new("tags", AttributeType::Map(Box::new(AttributeType::String)))
        .description("A mapping of tags to assign to the resource")
        .optional()
        .validator(crate::tags::TagsValidator::shared())
        .build()
}

/// The import guard's error: the object already exists server-side but is
/// not in state.
pub fn import_as_exists_error(resource_type: &str, id: &impl std::fmt::Display) -> Diagnostic {
    Diagnostic::error(
        "Resource already exists",
        format!(
            "A resource with the ID {:?} already exists - to be managed via Terraform this resource needs to be imported into the State. Please see the resource documentation for {:?} for more information.",
            id.to_string(),
            resource_type
        ),
    )
}

pub fn provider_not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "The provider must be configured before resources can be managed",
    )
}

/// Flatten helper: `Vec<String>` into a Dynamic list.
pub fn string_list(values: &[String]) -> Vec<Dynamic> {
    values
        .iter()
        .map(|v| Dynamic::String(v.clone()))
        .collect()
}

/// Expand helper: Dynamic list into the strings it holds. Non-string
/// members were rejected by schema validation already.
pub fn expand_string_list(items: &[Dynamic]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Dynamic::String(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

//! Schema types and builders.
//!
//! A resource or data source declares its configuration surface as a static
//! [`Schema`]: attribute names, types, required/optional/computed flags, a
//! force-new marker for attributes whose change requires replacement, a
//! static default, and validators. The gRPC layer derives plan behavior
//! (computed-unknown marking, requires-replace paths) from these flags, so
//! CRUD code never hand-rolls diff logic.

use crate::types::{AttributePath, Diagnostic, Dynamic};
use std::collections::HashMap;
use std::sync::Arc;

/// AttributeType mirrors Terraform's type system.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number, // Always f64
    Bool,
    List(Box<AttributeType>),               // Ordered, allows duplicates
    Set(Box<AttributeType>),                // Unordered, no duplicates
    Map(Box<AttributeType>),                // String keys only
    Object(HashMap<String, AttributeType>), // Fixed structure
}

impl AttributeType {
    /// Terraform's JSON type constraint encoding, used on the wire:
    /// `"string"`, `["list","string"]`, `["object",{"a":"bool"}]`, ...
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{json, Value};
        match self {
            AttributeType::String => json!("string"),
            AttributeType::Number => json!("number"),
            AttributeType::Bool => json!("bool"),
            AttributeType::List(elem) => json!(["list", elem.to_json()]),
            AttributeType::Set(elem) => json!(["set", elem.to_json()]),
            AttributeType::Map(elem) => json!(["map", elem.to_json()]),
            AttributeType::Object(attrs) => {
                let fields: serde_json::Map<String, Value> = attrs
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.to_json()))
                    .collect();
                json!(["object", fields])
            }
        }
    }
}

/// Schema is returned by providers, resources and data sources. The version
/// participates in state migration: bump it when an attribute changes shape.
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

impl Schema {
    /// Look up an attribute declaration by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|a| a.name == name)
    }
}

/// Root configuration block of a schema.
#[derive(Debug, Clone)]
pub struct Block {
    pub version: i64,
    pub attributes: Vec<Attribute>,
    pub description: String,
    pub description_kind: StringKind,
    pub deprecated: bool,
}

/// A single configuration attribute.
///
/// Validators are shared behind `Arc` so cloning a schema keeps them; a
/// schema is built once per resource type and cloned freely after that.
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Changing this attribute forces replacement of the resource.
    pub force_new: bool,
    /// Applied when the attribute is optional and absent from config.
    pub default: Option<Dynamic>,
    pub validators: Vec<Arc<dyn Validator>>,
    pub deprecated: bool,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("force_new", &self.force_new)
            .field("default", &self.default)
            .field("validators", &format!("{} validators", self.validators.len()))
            .field("deprecated", &self.deprecated)
            .finish()
    }
}

/// String format of descriptions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StringKind {
    Plain,
    Markdown,
}

/// Validator checks a configured value during `ValidateResourceConfig`.
/// Null and unknown values are never passed to validators.
pub trait Validator: Send + Sync {
    /// Human-readable description, used in error detail.
    fn description(&self) -> String;

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>);
}

/// Fluent builder for attributes. Always use this instead of constructing
/// `Attribute` directly.
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                force_new: false,
                default: None,
                validators: Vec::new(),
                deprecated: false,
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    /// Changes to this attribute replace the resource instead of updating
    /// it in place.
    pub fn force_new(mut self) -> Self {
        self.attribute.force_new = true;
        self
    }

    pub fn default_value(mut self, value: Dynamic) -> Self {
        self.attribute.default = Some(value);
        self
    }

    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.attribute.validators.push(validator);
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.attribute.deprecated = true;
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// Fluent builder for schemas.
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block {
                    version: 0,
                    attributes: Vec::new(),
                    description: String::new(),
                    description_kind: StringKind::Plain,
                    deprecated: false,
                },
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self.schema.block.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn attributes(mut self, attrs: impl IntoIterator<Item = Attribute>) -> Self {
        self.schema.block.attributes.extend(attrs);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_builder_creates_required_string() {
        let attr = AttributeBuilder::new("name", AttributeType::String)
            .description("The name of the resource")
            .required()
            .force_new()
            .build();

        assert_eq!(attr.name, "name");
        assert!(matches!(attr.r#type, AttributeType::String));
        assert!(attr.required);
        assert!(!attr.optional);
        assert!(attr.force_new);
    }

    #[test]
    fn schema_builder_collects_attributes() {
        let schema = SchemaBuilder::new()
            .version(1)
            .description("Test resource schema")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .build(),
            )
            .build();

        assert_eq!(schema.version, 1);
        assert_eq!(schema.block.attributes.len(), 2);
        assert!(schema.attribute("id").unwrap().computed);
        assert!(schema.attribute("missing").is_none());
    }

    #[test]
    fn cloned_schema_keeps_validators() {
        struct Nop;
        impl Validator for Nop {
            fn description(&self) -> String {
                "nop".to_string()
            }
            fn validate(&self, _: &Dynamic, _: &AttributePath, _: &mut Vec<Diagnostic>) {}
        }

        let schema = SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .validator(Arc::new(Nop))
                    .build(),
            )
            .build();

        let cloned = schema.clone();
        assert_eq!(cloned.attribute("name").unwrap().validators.len(), 1);
    }

    #[test]
    fn type_constraint_json_encoding() {
        assert_eq!(AttributeType::String.to_json(), serde_json::json!("string"));
        assert_eq!(
            AttributeType::List(Box::new(AttributeType::Number)).to_json(),
            serde_json::json!(["list", "number"])
        );

        let obj = AttributeType::Object(HashMap::from([(
            "port".to_string(),
            AttributeType::Number,
        )]));
        assert_eq!(
            AttributeType::Set(Box::new(obj)).to_json(),
            serde_json::json!(["set", ["object", { "port": "number" }]])
        );
    }

    #[test]
    fn default_value_is_carried() {
        let attr = AttributeBuilder::new("enabled", AttributeType::Bool)
            .optional()
            .default_value(Dynamic::Bool(true))
            .build();

        assert_eq!(attr.default, Some(Dynamic::Bool(true)));
    }
}

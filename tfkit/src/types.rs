//! Core value types shared between the wire layer and provider code.
//!
//! Everything Terraform hands a provider arrives as a [`DynamicValue`]: an
//! untyped tree that the resource's schema gives meaning to. Providers read
//! and write it through [`AttributePath`]-addressed accessors rather than
//! matching on the tree directly.

use crate::error::{Result, TfkitError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dynamic represents Terraform values that can be of any type.
///
/// All numbers are f64 to match Terraform's number model. `Unknown` is the
/// planning-time placeholder for values the provider will only know after
/// apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Ordered, allows duplicates. Sets are carried as lists on the wire.
    List(Vec<Dynamic>),
    /// Objects and maps are both represented as string-keyed maps.
    Map(HashMap<String, Dynamic>),
    Unknown,
}

const UNKNOWN_SENTINEL: &str = "__unknown__";

impl Serialize for Dynamic {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Dynamic::Null => serializer.serialize_unit(),
            Dynamic::Bool(b) => serializer.serialize_bool(*b),
            Dynamic::Number(n) => serializer.serialize_f64(*n),
            Dynamic::String(s) => serializer.serialize_str(s),
            Dynamic::List(l) => l.serialize(serializer),
            Dynamic::Map(m) => m.serialize(serializer),
            Dynamic::Unknown => serializer.serialize_str(UNKNOWN_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        use std::fmt;

        struct DynamicVisitor;

        impl<'de> Visitor<'de> for DynamicVisitor {
            type Value = Dynamic;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a terraform value")
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Null)
            }

            fn visit_none<E: de::Error>(self) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Null)
            }

            fn visit_some<D2>(self, deserializer: D2) -> std::result::Result<Dynamic, D2::Error>
            where
                D2: serde::Deserializer<'de>,
            {
                Dynamic::deserialize(deserializer)
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Bool(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Number(value as f64))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Number(value as f64))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Dynamic, E> {
                Ok(Dynamic::Number(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Dynamic, E> {
                if value == UNKNOWN_SENTINEL {
                    Ok(Dynamic::Unknown)
                } else {
                    Ok(Dynamic::String(value.to_string()))
                }
            }

            fn visit_string<E: de::Error>(self, value: String) -> std::result::Result<Dynamic, E> {
                if value == UNKNOWN_SENTINEL {
                    Ok(Dynamic::Unknown)
                } else {
                    Ok(Dynamic::String(value))
                }
            }

            fn visit_seq<V>(self, mut seq: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Dynamic::List(vec))
            }

            fn visit_map<V>(self, mut map: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut hashmap = HashMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    hashmap.insert(key, value);
                }
                Ok(Dynamic::Map(hashmap))
            }
        }

        deserializer.deserialize_any(DynamicVisitor)
    }
}

/// DynamicValue wraps Dynamic and provides the wire encoding plus type-safe
/// path navigation. Terraform encodes values as msgpack by default with a
/// JSON fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    /// An empty object value, the usual starting point when flattening API
    /// responses into state.
    pub fn empty_object() -> Self {
        Self {
            value: Dynamic::Map(HashMap::new()),
        }
    }

    pub fn null() -> Self {
        Self {
            value: Dynamic::Null,
        }
    }

    pub fn unknown() -> Self {
        Self {
            value: Dynamic::Unknown,
        }
    }

    pub fn encode_msgpack(&self) -> Result<Vec<u8>> {
        match &self.value {
            Dynamic::Null => Ok(vec![]),
            value => rmp_serde::encode::to_vec(value)
                .map_err(|e| TfkitError::EncodingError(format!("msgpack encoding failed: {}", e))),
        }
    }

    pub fn decode_msgpack(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::null());
        }

        match rmp_serde::decode::from_slice::<Dynamic>(data) {
            Ok(value) => Ok(Self { value }),
            Err(e) => Err(TfkitError::DecodingError(format!(
                "msgpack decoding failed: {}",
                e
            ))),
        }
    }

    pub fn encode_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.value)
            .map_err(|e| TfkitError::EncodingError(format!("json encoding failed: {}", e)))
    }

    pub fn decode_json(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::null());
        }
        let value = serde_json::from_slice(data)
            .map_err(|e| TfkitError::DecodingError(format!("json decoding failed: {}", e)))?;
        Ok(Self { value })
    }

    /// Typed accessors. These return an error when the attribute is absent
    /// or of the wrong type; use the `try_*` variants for optional
    /// attributes.
    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        match self.navigate(path)? {
            Dynamic::String(s) => Ok(s.clone()),
            other => Err(type_mismatch("string", other)),
        }
    }

    pub fn get_number(&self, path: &AttributePath) -> Result<f64> {
        match self.navigate(path)? {
            Dynamic::Number(n) => Ok(*n),
            other => Err(type_mismatch("number", other)),
        }
    }

    pub fn get_bool(&self, path: &AttributePath) -> Result<bool> {
        match self.navigate(path)? {
            Dynamic::Bool(b) => Ok(*b),
            other => Err(type_mismatch("bool", other)),
        }
    }

    pub fn get_list(&self, path: &AttributePath) -> Result<Vec<Dynamic>> {
        match self.navigate(path)? {
            Dynamic::List(l) => Ok(l.clone()),
            other => Err(type_mismatch("list", other)),
        }
    }

    pub fn get_map(&self, path: &AttributePath) -> Result<HashMap<String, Dynamic>> {
        match self.navigate(path)? {
            Dynamic::Map(m) => Ok(m.clone()),
            other => Err(type_mismatch("map", other)),
        }
    }

    /// Optional-attribute accessors: absent, null and unknown all read as
    /// `None`; only a genuinely wrong type is an error worth surfacing, and
    /// these fold that into `None` too since schema validation has already
    /// run by the time CRUD code reads config.
    pub fn try_get_string(&self, path: &AttributePath) -> Option<String> {
        self.get_string(path).ok()
    }

    pub fn try_get_number(&self, path: &AttributePath) -> Option<f64> {
        self.get_number(path).ok()
    }

    pub fn try_get_bool(&self, path: &AttributePath) -> Option<bool> {
        self.get_bool(path).ok()
    }

    pub fn try_get_list(&self, path: &AttributePath) -> Option<Vec<Dynamic>> {
        self.get_list(path).ok()
    }

    pub fn try_get_map(&self, path: &AttributePath) -> Option<HashMap<String, Dynamic>> {
        self.get_map(path).ok()
    }

    pub fn set_string(&mut self, path: &AttributePath, value: String) -> Result<()> {
        self.set_value(path, Dynamic::String(value))
    }

    pub fn set_number(&mut self, path: &AttributePath, value: f64) -> Result<()> {
        self.set_value(path, Dynamic::Number(value))
    }

    pub fn set_bool(&mut self, path: &AttributePath, value: bool) -> Result<()> {
        self.set_value(path, Dynamic::Bool(value))
    }

    pub fn set_list(&mut self, path: &AttributePath, value: Vec<Dynamic>) -> Result<()> {
        self.set_value(path, Dynamic::List(value))
    }

    pub fn set_map(&mut self, path: &AttributePath, value: HashMap<String, Dynamic>) -> Result<()> {
        self.set_value(path, Dynamic::Map(value))
    }

    pub fn set_null(&mut self, path: &AttributePath) -> Result<()> {
        self.set_value(path, Dynamic::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.value, Dynamic::Unknown)
    }

    /// Mark a computed attribute as unknown during planning.
    pub fn mark_unknown(&mut self, path: &AttributePath) -> Result<()> {
        self.set_value(path, Dynamic::Unknown)
    }

    /// Returns the value at `path`, or `Dynamic::Null` when the path does
    /// not resolve.
    pub fn value_at(&self, path: &AttributePath) -> Dynamic {
        self.navigate(path).cloned().unwrap_or(Dynamic::Null)
    }

    fn navigate<'a>(&'a self, path: &AttributePath) -> Result<&'a Dynamic> {
        let mut current = &self.value;

        for step in &path.steps {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name)) => m
                    .get(name)
                    .ok_or_else(|| TfkitError::AttributeNotFound(name.clone()))?,
                (Dynamic::Map(m), AttributePathStep::ElementKeyString(key)) => m
                    .get(key)
                    .ok_or_else(|| TfkitError::AttributeNotFound(key.clone()))?,
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                    l.get(*idx as usize).ok_or_else(|| {
                        TfkitError::Custom(format!("list index {} out of bounds", idx))
                    })?
                }
                _ => {
                    return Err(TfkitError::Custom(format!(
                        "cannot navigate {:?} into non-collection value",
                        step
                    )))
                }
            };
        }

        Ok(current)
    }

    pub fn set_value(&mut self, path: &AttributePath, new_value: Dynamic) -> Result<()> {
        if path.steps.is_empty() {
            self.value = new_value;
            return Ok(());
        }

        if !matches!(self.value, Dynamic::Map(_)) {
            self.value = Dynamic::Map(HashMap::new());
        }

        let mut current = &mut self.value;
        let last_idx = path.steps.len() - 1;

        for (idx, step) in path.steps.iter().enumerate() {
            let is_last = idx == last_idx;
            match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                    if is_last {
                        m.insert(name.clone(), new_value);
                        return Ok(());
                    }
                    let next = m.entry(name.clone()).or_insert_with(|| {
                        match path.steps.get(idx + 1) {
                            Some(AttributePathStep::ElementKeyInt(_)) => Dynamic::List(Vec::new()),
                            _ => Dynamic::Map(HashMap::new()),
                        }
                    });
                    current = next;
                }
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(i)) => {
                    let i = *i as usize;
                    if i >= l.len() {
                        return Err(TfkitError::Custom(format!(
                            "list index {} out of bounds",
                            i
                        )));
                    }
                    if is_last {
                        l[i] = new_value;
                        return Ok(());
                    }
                    current = &mut l[i];
                }
                _ => {
                    return Err(TfkitError::Custom(format!(
                        "cannot navigate {:?} into non-collection value",
                        step
                    )))
                }
            }
        }

        Err(TfkitError::Custom("failed to set value".to_string()))
    }
}

fn type_mismatch(expected: &str, actual: &Dynamic) -> TfkitError {
    TfkitError::TypeMismatch {
        expected: expected.to_string(),
        actual: dynamic_type_name(actual).to_string(),
    }
}

pub(crate) fn dynamic_type_name(value: &Dynamic) -> &'static str {
    match value {
        Dynamic::Null => "null",
        Dynamic::Bool(_) => "bool",
        Dynamic::Number(_) => "number",
        Dynamic::String(_) => "string",
        Dynamic::List(_) => "list",
        Dynamic::Map(_) => "map",
        Dynamic::Unknown => "unknown",
    }
}

/// AttributePath addresses a value inside a DynamicValue.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributePath {
    pub steps: Vec<AttributePathStep>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self {
            steps: vec![AttributePathStep::AttributeName(name.to_string())],
        }
    }

    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps
            .push(AttributePathStep::AttributeName(name.to_string()));
        self
    }

    pub fn index(mut self, idx: i64) -> Self {
        self.steps.push(AttributePathStep::ElementKeyInt(idx));
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.steps
            .push(AttributePathStep::ElementKeyString(key.to_string()));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributePathStep {
    AttributeName(String),
    ElementKeyString(String),
    ElementKeyInt(i64),
}

/// RawState holds the stored state for a resource to be upgraded.
#[derive(Debug, Clone, Default)]
pub struct RawState {
    pub json: Option<Vec<u8>>,
    pub flatmap: Option<HashMap<String, String>>,
}

/// Diagnostic represents a warning or error surfaced to Terraform.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiagnosticSeverity {
    Invalid,
    Error,
    Warning,
}

/// True when any diagnostic in the slice is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics
        .iter()
        .any(|d| d.severity == DiagnosticSeverity::Error)
}

/// ServerCapabilities advertised to Terraform core.
#[derive(Debug, Clone, Default)]
pub struct ServerCapabilities {
    pub plan_destroy: bool,
    pub get_provider_schema_optional: bool,
    pub move_resource_state: bool,
}

/// ClientCapabilities advertised by Terraform core.
#[derive(Debug, Clone, Default)]
pub struct ClientCapabilities {
    pub deferral_allowed: bool,
    pub write_only_attributes_allowed: bool,
}

/// Config and State are both DynamicValues; the aliases keep signatures
/// readable.
pub type Config = DynamicValue;
pub type State = DynamicValue;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_value_string_round_trip() {
        let mut dv = DynamicValue::empty_object();
        dv.set_string(&AttributePath::new("name"), "example".to_string())
            .unwrap();

        assert_eq!(
            dv.get_string(&AttributePath::new("name")).unwrap(),
            "example"
        );
    }

    #[test]
    fn dynamic_value_nested_path_set_creates_intermediates() {
        let mut dv = DynamicValue::empty_object();
        let path = AttributePath::new("sku").attribute("name");
        dv.set_string(&path, "Standard".to_string()).unwrap();

        assert_eq!(dv.get_string(&path).unwrap(), "Standard");
    }

    #[test]
    fn missing_attribute_is_an_error_but_try_get_is_none() {
        let dv = DynamicValue::empty_object();
        assert!(dv.get_string(&AttributePath::new("absent")).is_err());
        assert!(dv.try_get_string(&AttributePath::new("absent")).is_none());
    }

    #[test]
    fn msgpack_round_trip_preserves_unknown() {
        let mut dv = DynamicValue::empty_object();
        dv.mark_unknown(&AttributePath::new("id")).unwrap();
        dv.set_bool(&AttributePath::new("enabled"), true).unwrap();

        let encoded = dv.encode_msgpack().unwrap();
        let decoded = DynamicValue::decode_msgpack(&encoded).unwrap();

        assert_eq!(decoded.value_at(&AttributePath::new("id")), Dynamic::Unknown);
        assert_eq!(
            decoded.value_at(&AttributePath::new("enabled")),
            Dynamic::Bool(true)
        );
    }

    #[test]
    fn null_encodes_as_empty_and_decodes_back() {
        let dv = DynamicValue::null();
        let encoded = dv.encode_msgpack().unwrap();
        assert!(encoded.is_empty());
        assert!(DynamicValue::decode_msgpack(&encoded).unwrap().is_null());
    }

    #[test]
    fn json_round_trip_for_nested_list() {
        let mut dv = DynamicValue::empty_object();
        dv.set_list(
            &AttributePath::new("zones"),
            vec![
                Dynamic::String("1".to_string()),
                Dynamic::String("2".to_string()),
            ],
        )
        .unwrap();

        let encoded = dv.encode_json().unwrap();
        let decoded = DynamicValue::decode_json(&encoded).unwrap();
        assert_eq!(
            decoded.get_list(&AttributePath::new("zones")).unwrap().len(),
            2
        );
    }

    #[test]
    fn has_errors_distinguishes_warnings() {
        let diags = vec![Diagnostic::warning("w", "")];
        assert!(!has_errors(&diags));

        let diags = vec![Diagnostic::warning("w", ""), Diagnostic::error("e", "")];
        assert!(has_errors(&diags));
    }
}

//! Typed view of OpenAPI schema objects.
//!
//! Only the keywords the generator looks at are modelled; anything else in the
//! document is ignored on deserialization. Composition keywords are kept as
//! `Option<Vec<_>>` so that a schema which merely *declares* `oneOf: []` is
//! still recognised as composed.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Prefix of local component schema references.
pub const COMPONENTS_PREFIX: &str = "#/components/schemas/";

/// Prefix of Swagger 2 definition references.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// The `type` keyword: a single name, or a list of names in OpenAPI 3.1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeDecl {
    One(String),
    Many(Vec<String>),
}

impl TypeDecl {
    /// First declared type that is not `"null"`.
    pub fn primary(&self) -> Option<&str> {
        match self {
            TypeDecl::One(name) if name != "null" => Some(name.as_str()),
            TypeDecl::One(_) => None,
            TypeDecl::Many(names) => names.iter().map(String::as_str).find(|n| *n != "null"),
        }
    }

    /// Whether `"null"` is one of the declared types.
    pub fn includes_null(&self) -> bool {
        match self {
            TypeDecl::One(name) => name == "null",
            TypeDecl::Many(names) => names.iter().any(|n| n == "null"),
        }
    }
}

/// `additionalProperties`: either a flag or a value schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Any(bool),
    Schema(Box<Schema>),
}

/// A schema node from the parsed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default)]
    pub nullable: bool,

    #[serde(rename = "oneOf", default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,

    #[serde(rename = "allOf", default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,

    #[serde(rename = "anyOf", default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,

    #[serde(
        default,
        deserialize_with = "lenient_items",
        skip_serializing_if = "Option::is_none"
    )]
    pub items: Option<Box<Schema>>,

    #[serde(rename = "uniqueItems", default)]
    pub unique_items: bool,

    #[serde(
        default,
        deserialize_with = "lenient_properties",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub properties: IndexMap<String, Schema>,

    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Schema {
    /// Deserialize a schema from a raw JSON value, falling back to the
    /// untyped (empty) schema when the value has an unexpected shape.
    ///
    /// OpenAPI 3.1 boolean schemas (`true`/`false`) are read as untyped.
    pub fn from_json(value: &JsonValue) -> Self {
        if value.is_boolean() {
            return Schema::default();
        }
        serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            log::warn!("Treating unreadable schema as untyped: {}", e);
            Schema::default()
        })
    }

    /// Whether the node combines others through `oneOf`, `allOf` or `anyOf`.
    pub fn is_composed(&self) -> bool {
        self.one_of.is_some() || self.all_of.is_some() || self.any_of.is_some()
    }

    /// `oneOf` members, empty when the keyword is absent.
    pub fn one_of(&self) -> &[Schema] {
        self.one_of.as_deref().unwrap_or_default()
    }

    /// `allOf` members, empty when the keyword is absent.
    pub fn all_of(&self) -> &[Schema] {
        self.all_of.as_deref().unwrap_or_default()
    }

    /// First non-null declared type.
    pub fn primary_type(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(TypeDecl::primary)
    }

    /// Whether the value may be absent (`nullable: true` or a `"null"` type member).
    pub fn is_nullable(&self) -> bool {
        self.nullable
            || self
                .schema_type
                .as_ref()
                .map(TypeDecl::includes_null)
                .unwrap_or(false)
    }

    /// Whether this node only stands for the absence of a value inside a union.
    pub fn is_null_marker(&self) -> bool {
        match &self.schema_type {
            Some(decl) => decl.includes_null() && decl.primary().is_none(),
            None => {
                self.reference.is_none()
                    && !self.is_composed()
                    && self.enum_values.len() == 1
                    && self.enum_values[0].is_null()
            }
        }
    }

    /// Name of the referenced component, if this node is a local `$ref`.
    pub fn ref_name(&self) -> Option<&str> {
        let reference = self.reference.as_deref()?;
        reference
            .strip_prefix(COMPONENTS_PREFIX)
            .or_else(|| reference.strip_prefix(DEFINITIONS_PREFIX))
    }

    /// Whether the node, as a component, deserves its own model class.
    pub fn is_model(&self) -> bool {
        if self.reference.is_some() {
            return false;
        }
        if !self.enum_values.is_empty() {
            return true;
        }
        if self.all_of.is_some() {
            return true;
        }
        !self.properties.is_empty()
    }
}

/// Reads each property on its own so one malformed entry does not discard
/// the whole object.
fn lenient_properties<'de, D>(deserializer: D) -> Result<IndexMap<String, Schema>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, JsonValue>::deserialize(deserializer)?;
    Ok(raw
        .iter()
        .map(|(name, value)| (name.clone(), Schema::from_json(value)))
        .collect())
}

fn lenient_items<'de, D>(deserializer: D) -> Result<Option<Box<Schema>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(raw.map(|value| Box::new(Schema::from_json(&value))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_one_of_is_still_composed() {
        let schema = Schema::from_json(&json!({"oneOf": []}));
        assert!(schema.is_composed());
        assert!(schema.one_of().is_empty());

        let plain = Schema::from_json(&json!({"type": "string"}));
        assert!(!plain.is_composed());
    }

    #[test]
    fn test_null_markers() {
        assert!(Schema::from_json(&json!({"type": "null"})).is_null_marker());
        assert!(Schema::from_json(&json!({"type": ["null"]})).is_null_marker());
        assert!(Schema::from_json(&json!({"enum": [null]})).is_null_marker());
        assert!(!Schema::from_json(&json!({"type": ["string", "null"]})).is_null_marker());
        assert!(!Schema::from_json(&json!({"$ref": "#/components/schemas/A"})).is_null_marker());
        assert!(!Schema::default().is_null_marker());
    }

    #[test]
    fn test_type_lists() {
        let schema = Schema::from_json(&json!({"type": ["null", "integer"]}));
        assert_eq!(schema.primary_type(), Some("integer"));
        assert!(schema.is_nullable());
    }

    #[test]
    fn test_ref_name() {
        let v3 = Schema::from_json(&json!({"$ref": "#/components/schemas/Pet"}));
        assert_eq!(v3.ref_name(), Some("Pet"));
        let v2 = Schema::from_json(&json!({"$ref": "#/definitions/Pet"}));
        assert_eq!(v2.ref_name(), Some("Pet"));
        let remote = Schema::from_json(&json!({"$ref": "other.yaml#/Pet"}));
        assert_eq!(remote.ref_name(), None);
    }

    #[test]
    fn test_malformed_schema_is_untyped() {
        let schema = Schema::from_json(&json!({"oneOf": "not-a-list"}));
        assert_eq!(schema, Schema::default());
    }

    #[test]
    fn test_properties_keep_document_order() {
        let schema = Schema::from_json(&json!({
            "type": "object",
            "properties": {"zeta": {"type": "string"}, "alpha": {"type": "string"}}
        }));
        let names: Vec<_> = schema.properties.keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert!(schema.is_model());
    }

    #[test]
    fn test_malformed_property_keeps_the_rest() {
        let schema = Schema::from_json(&json!({
            "type": "object",
            "format": "pet",
            "required": ["id"],
            "properties": {
                "id": {"type": "string", "format": "uuid"},
                "anything": true,
                "broken": {"oneOf": "not-a-list"},
                "tags": {"type": "array", "items": true}
            }
        }));
        assert!(schema.is_model());
        assert_eq!(schema.format.as_deref(), Some("pet"));
        assert_eq!(schema.properties.len(), 4);
        assert_eq!(schema.properties["id"].format.as_deref(), Some("uuid"));
        assert_eq!(schema.properties["anything"], Schema::default());
        assert_eq!(schema.properties["broken"], Schema::default());
        assert_eq!(schema.properties["tags"].items.as_deref(), Some(&Schema::default()));
    }
}

//! Default Java type mapping.
//!
//! Abstract type keys (`string`, `long`, `DateTime`, `array`, ...) are looked
//! up in a mutable `type_mapping` table, the same way openapi-generator
//! languages configure their output. Every value is a name that compiles
//! without an import (`java.lang` types or fully qualified names).

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use super::{HostTypeMapping, TypeResolver};
use crate::schema::{AdditionalProperties, Schema};
use crate::utils::to_class_name;

const DEFAULT_TYPE_MAPPING: &[(&str, &str)] = &[
    ("string", "String"),
    ("integer", "Integer"),
    ("long", "Long"),
    ("float", "Float"),
    ("double", "Double"),
    ("number", "java.math.BigDecimal"),
    ("boolean", "Boolean"),
    ("date", "java.time.LocalDate"),
    ("DateTime", "java.time.OffsetDateTime"),
    ("ByteArray", "byte[]"),
    ("binary", "java.io.File"),
    ("array", "java.util.List"),
    ("set", "java.util.Set"),
    ("map", "java.util.Map"),
    ("object", "java.lang.Object"),
    ("AnyType", "java.lang.Object"),
];

/// Alias chains longer than this are treated as models.
const MAX_ALIAS_HOPS: usize = 8;

thread_local! {
    static UNALIASING: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug, Clone)]
pub struct JavaTypeMapping {
    type_mapping: HashMap<String, String>,
    components: IndexMap<String, Schema>,
}

impl Default for JavaTypeMapping {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaTypeMapping {
    pub fn new() -> Self {
        Self {
            type_mapping: DEFAULT_TYPE_MAPPING
                .iter()
                .map(|(key, ty)| (key.to_string(), ty.to_string()))
                .collect(),
            components: IndexMap::new(),
        }
    }

    /// Defaults with configured entries layered on top.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut mapping = Self::new();
        for (key, ty) in overrides {
            mapping.insert(key.clone(), ty.clone());
        }
        mapping
    }

    /// Component schemas used to tell models from aliases behind `$ref`s.
    pub fn with_components(mut self, components: IndexMap<String, Schema>) -> Self {
        self.components = components;
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, ty: impl Into<String>) {
        self.type_mapping.insert(key.into(), ty.into());
    }

    /// Mapped name for `key`, or `key` itself when unmapped.
    pub fn mapped<'a>(&'a self, key: &'a str) -> &'a str {
        self.type_mapping.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn type_mapping(&self) -> &HashMap<String, String> {
        &self.type_mapping
    }

    pub fn components(&self) -> &IndexMap<String, Schema> {
        &self.components
    }

    fn reference_type(&self, name: &str, resolver: &dyn TypeResolver) -> String {
        let mut current = name;
        for _ in 0..MAX_ALIAS_HOPS {
            let Some(target) = self.components.get(current) else {
                return to_class_name(current);
            };
            if target.is_model() {
                return to_class_name(current);
            }
            match target.ref_name() {
                Some(next) => current = next,
                None => return self.unalias(current, target, resolver),
            }
        }
        to_class_name(current)
    }

    /// Resolve a non-model component inline, refusing self-referencing aliases.
    fn unalias(&self, name: &str, target: &Schema, resolver: &dyn TypeResolver) -> String {
        let recursive = UNALIASING.with(|stack| stack.borrow().iter().any(|n| n == name));
        if recursive {
            log::debug!("Alias {} refers to itself; using {}", name, self.mapped("AnyType"));
            return self.mapped("AnyType").to_string();
        }

        UNALIASING.with(|stack| stack.borrow_mut().push(name.to_string()));
        let ty = resolver.resolve(target);
        UNALIASING.with(|stack| {
            stack.borrow_mut().pop();
        });
        ty
    }

    fn string_type(&self, format: Option<&str>) -> String {
        let key = match format {
            Some("date") => "date",
            Some("date-time") => "DateTime",
            Some("byte") => "ByteArray",
            Some("binary") => "binary",
            _ => "string",
        };
        self.mapped(key).to_string()
    }

    fn number_type(&self, format: Option<&str>) -> String {
        let key = match format {
            Some("float") => "float",
            Some("double") => "double",
            _ => "number",
        };
        self.mapped(key).to_string()
    }

    fn array_type(&self, schema: &Schema, resolver: &dyn TypeResolver) -> String {
        let item = schema
            .items
            .as_deref()
            .map(|items| resolver.resolve(items))
            .unwrap_or_else(|| self.mapped("AnyType").to_string());
        let container = if schema.unique_items { "set" } else { "array" };
        format!("{}<{}>", self.mapped(container), item)
    }

    fn object_type(&self, schema: &Schema, resolver: &dyn TypeResolver) -> String {
        let value = match &schema.additional_properties {
            Some(AdditionalProperties::Schema(value)) => resolver.resolve(value),
            Some(AdditionalProperties::Any(true)) if schema.properties.is_empty() => {
                self.mapped("AnyType").to_string()
            }
            _ => return self.mapped("object").to_string(),
        };
        format!("{}<{}, {}>", self.mapped("map"), self.mapped("string"), value)
    }
}

impl HostTypeMapping for JavaTypeMapping {
    fn default_type(&self, schema: &Schema, resolver: &dyn TypeResolver) -> String {
        if schema.reference.is_some() {
            return match schema.ref_name() {
                Some(name) => self.reference_type(name, resolver),
                None => {
                    log::debug!(
                        "Unsupported reference {:?}; using {}",
                        schema.reference,
                        self.mapped("object")
                    );
                    self.mapped("object").to_string()
                }
            };
        }

        // `allOf: [$ref]` is the usual way to attach a description to a reference
        if let [only] = schema.all_of() {
            return resolver.resolve(only);
        }

        let format = schema.format.as_deref();
        match schema.primary_type() {
            Some("string") => self.string_type(format),
            Some("integer") if format == Some("int64") => self.mapped("long").to_string(),
            Some("integer") => self.mapped("integer").to_string(),
            Some("number") => self.number_type(format),
            Some("boolean") => self.mapped("boolean").to_string(),
            Some("array") => self.array_type(schema, resolver),
            Some("file") => self.mapped("binary").to_string(),
            Some("object") | None => self.object_type(schema, resolver),
            Some(other) => {
                log::debug!("Unknown schema type '{}'; using {}", other, self.mapped("AnyType"));
                self.mapped("AnyType").to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FormatTable, SchemaTypeResolver};
    use serde_json::{json, Value as JsonValue};

    fn resolve_with(mapping: JavaTypeMapping, value: JsonValue) -> String {
        let resolver =
            SchemaTypeResolver::new(FormatTable::from_iter([("uuid", "java.util.UUID")]), mapping);
        resolver.resolve(&Schema::from_json(&value))
    }

    fn resolve(value: JsonValue) -> String {
        resolve_with(JavaTypeMapping::new(), value)
    }

    #[test]
    fn test_primitives() {
        assert_eq!(resolve(json!({"type": "string"})), "String");
        assert_eq!(resolve(json!({"type": "string", "format": "date"})), "java.time.LocalDate");
        assert_eq!(
            resolve(json!({"type": "string", "format": "date-time"})),
            "java.time.OffsetDateTime"
        );
        assert_eq!(resolve(json!({"type": "integer"})), "Integer");
        assert_eq!(resolve(json!({"type": "integer", "format": "int64"})), "Long");
        assert_eq!(resolve(json!({"type": "number"})), "java.math.BigDecimal");
        assert_eq!(resolve(json!({"type": "number", "format": "double"})), "Double");
        assert_eq!(resolve(json!({"type": "boolean"})), "Boolean");
        assert_eq!(resolve(json!({"type": ["string", "null"]})), "String");
    }

    #[test]
    fn test_containers_resolve_items_through_overrides() {
        assert_eq!(
            resolve(json!({"type": "array", "items": {"type": "string", "format": "uuid"}})),
            "java.util.List<java.util.UUID>"
        );
        assert_eq!(
            resolve(json!({"type": "array", "uniqueItems": true, "items": {"type": "integer"}})),
            "java.util.Set<Integer>"
        );
        assert_eq!(
            resolve(json!({"type": "object", "additionalProperties": {"type": "boolean"}})),
            "java.util.Map<String, Boolean>"
        );
        assert_eq!(resolve(json!({"type": "object"})), "java.lang.Object");
    }

    #[test]
    fn test_references() {
        assert_eq!(resolve(json!({"$ref": "#/components/schemas/pet_owner"})), "PetOwner");
        assert_eq!(
            resolve(json!({"allOf": [{"$ref": "#/components/schemas/Pet"}]})),
            "Pet"
        );
        assert_eq!(resolve(json!({"$ref": "https://example.com/x.json"})), "java.lang.Object");
    }

    #[test]
    fn test_aliases_are_resolved_inline() {
        let components: IndexMap<String, Schema> = [
            ("Id", json!({"type": "string", "format": "uuid"})),
            ("Ids", json!({"type": "array", "items": {"$ref": "#/components/schemas/Id"}})),
            ("IdAlias", json!({"$ref": "#/components/schemas/Id"})),
            ("Loop", json!({"type": "array", "items": {"$ref": "#/components/schemas/Loop"}})),
            ("Pet", json!({"type": "object", "properties": {"id": {"type": "integer"}}})),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), Schema::from_json(&value)))
        .collect();
        let mapping = JavaTypeMapping::new().with_components(components);

        let r = |name: &str| {
            resolve_with(
                mapping.clone(),
                json!({"$ref": format!("#/components/schemas/{}", name)}),
            )
        };
        assert_eq!(r("Id"), "java.util.UUID");
        assert_eq!(r("Ids"), "java.util.List<java.util.UUID>");
        assert_eq!(r("IdAlias"), "java.util.UUID");
        assert_eq!(r("Loop"), "java.util.List<java.lang.Object>");
        assert_eq!(r("Pet"), "Pet");
    }

    #[test]
    fn test_overrides() {
        let overrides = BTreeMap::from([("DateTime".to_string(), "java.time.Instant".to_string())]);
        assert_eq!(
            resolve_with(
                JavaTypeMapping::with_overrides(&overrides),
                json!({"type": "string", "format": "date-time"})
            ),
            "java.time.Instant"
        );
    }
}

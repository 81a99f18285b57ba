//! Schema-to-type resolution.
//!
//! [`SchemaTypeResolver`] decides the Java type name used in generated code
//! for a schema node. It special-cases custom string formats and composed
//! `oneOf` schemas, and delegates everything else to a [`HostTypeMapping`]
//! (by default [`JavaTypeMapping`]).
//!
//! Resolution never fails: shapes that cannot be expressed degrade to the
//! untyped placeholder [`UNTYPED`].
//!
//! # Examples
//!
//! ```
//! use micronaut_gen_core::schema::Schema;
//! use micronaut_gen_core::types::{FormatTable, JavaTypeMapping, SchemaTypeResolver, TypeResolver};
//! use serde_json::json;
//!
//! let resolver = SchemaTypeResolver::new(
//!     FormatTable::from_iter([("uuid", "java.util.UUID")]),
//!     JavaTypeMapping::new(),
//! );
//!
//! let wrapped = Schema::from_json(&json!({
//!     "nullable": true,
//!     "oneOf": [{"type": "string", "format": "uuid"}]
//! }));
//! assert_eq!(resolver.resolve(&wrapped), "java.util.UUID");
//! ```

pub mod formats;
pub mod java;

pub use formats::FormatTable;
pub use java::JavaTypeMapping;

use crate::schema::Schema;

/// Placeholder for values whose type is not modelled (multi-member unions).
pub const UNTYPED: &str = "java.lang.Object";

/// Maximum number of nested nullable wrappers unwrapped before giving up.
pub const MAX_UNWRAP_DEPTH: usize = 8;

/// Anything able to name the type of a schema node.
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, schema: &Schema) -> String;
}

/// Default schema-to-type mapping used when no override applies.
///
/// Implementations receive the full resolver so nested schemas (array items,
/// map values, aliases) go through the overrides again.
pub trait HostTypeMapping: Send + Sync {
    fn default_type(&self, schema: &Schema, resolver: &dyn TypeResolver) -> String;
}

/// Resolves schema nodes to type names, applying format overrides and
/// collapsing single-member nullable `oneOf` wrappers.
#[derive(Debug, Clone)]
pub struct SchemaTypeResolver<H = JavaTypeMapping> {
    formats: FormatTable,
    host: H,
}

impl<H: HostTypeMapping> SchemaTypeResolver<H> {
    pub fn new(formats: FormatTable, host: H) -> Self {
        Self { formats, host }
    }

    pub fn formats(&self) -> &FormatTable {
        &self.formats
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn resolve_at(&self, schema: &Schema, depth: usize) -> String {
        if let Some(format) = schema.format.as_deref() {
            if let Some(ty) = self.formats.get(format) {
                log::info!("Use custom format {} with type {}.", format, ty);
                return ty.to_string();
            }
        }

        if schema.is_composed() {
            if let Some(ty) = self.composed_type(schema, depth) {
                return ty;
            }
        }

        self.host.default_type(schema, self)
    }

    /// `None` means the composed schema has no `oneOf` members and the host
    /// mapping decides.
    fn composed_type(&self, schema: &Schema, depth: usize) -> Option<String> {
        let one_of = schema.one_of();
        if one_of.is_empty() {
            return None;
        }

        if schema.nullable && one_of.len() == 1 {
            if let Some(inner) = one_of.iter().find(|member| !member.is_null_marker()) {
                if depth >= MAX_UNWRAP_DEPTH {
                    log::warn!(
                        "Nullable oneOf wrappers nested deeper than {}; using {}",
                        MAX_UNWRAP_DEPTH,
                        UNTYPED
                    );
                    return Some(UNTYPED.to_string());
                }
                return Some(self.resolve_at(inner, depth + 1));
            }
        }

        // unions are not modelled
        Some(UNTYPED.to_string())
    }
}

impl<H: HostTypeMapping> TypeResolver for SchemaTypeResolver<H> {
    fn resolve(&self, schema: &Schema) -> String {
        self.resolve_at(schema, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as JsonValue};

    /// Host stand-in that reports what it was asked for.
    struct EchoHost;

    impl HostTypeMapping for EchoHost {
        fn default_type(&self, schema: &Schema, _resolver: &dyn TypeResolver) -> String {
            format!(
                "host:{}",
                schema.primary_type().unwrap_or(if schema.is_composed() {
                    "composed"
                } else {
                    "none"
                })
            )
        }
    }

    fn resolver() -> SchemaTypeResolver<EchoHost> {
        SchemaTypeResolver::new(
            FormatTable::from_iter([("uuid", "UUID"), ("money", "Money")]),
            EchoHost,
        )
    }

    fn schema(value: JsonValue) -> Schema {
        Schema::from_json(&value)
    }

    #[test]
    fn test_custom_format_wins_over_everything() {
        let r = resolver();
        assert_eq!(r.resolve(&schema(json!({"type": "string", "format": "uuid"}))), "UUID");
        assert_eq!(r.resolve(&schema(json!({"type": "integer", "format": "money"}))), "Money");
        assert_eq!(
            r.resolve(&schema(json!({"format": "uuid", "nullable": true, "oneOf": [{}, {}]}))),
            "UUID"
        );
    }

    #[test]
    fn test_unknown_format_passes_through() {
        let r = resolver();
        assert_eq!(
            r.resolve(&schema(json!({"type": "string", "format": "email"}))),
            "host:string"
        );
    }

    #[test]
    fn test_nullable_single_wrapper_is_unwrapped() {
        let r = resolver();
        let wrapped = schema(json!({"nullable": true, "oneOf": [{"type": "integer"}]}));
        assert_eq!(r.resolve(&wrapped), "host:integer");
    }

    #[test]
    fn test_unwrapped_member_gets_format_override() {
        let r = resolver();
        let wrapped = schema(json!({
            "nullable": true,
            "oneOf": [{"type": "string", "format": "uuid"}]
        }));
        assert_eq!(r.resolve(&wrapped), "UUID");
    }

    #[test]
    fn test_wrapper_around_null_marker_is_untyped() {
        let r = resolver();
        let wrapped = schema(json!({"nullable": true, "oneOf": [{"type": "null"}]}));
        assert_eq!(r.resolve(&wrapped), UNTYPED);
    }

    #[test]
    fn test_single_member_without_nullable_is_untyped() {
        let r = resolver();
        let wrapped = schema(json!({"oneOf": [{"type": "integer"}]}));
        assert_eq!(r.resolve(&wrapped), UNTYPED);
    }

    #[test]
    fn test_multi_member_unions_are_untyped() {
        let r = resolver();
        for nullable in [true, false] {
            let union = schema(json!({
                "nullable": nullable,
                "oneOf": [{"type": "integer"}, {"type": "string"}]
            }));
            assert_eq!(r.resolve(&union), UNTYPED);
        }
        let with_null = schema(json!({
            "nullable": true,
            "oneOf": [{"type": "null"}, {"type": "string"}]
        }));
        assert_eq!(r.resolve(&with_null), UNTYPED);
    }

    #[test]
    fn test_empty_one_of_delegates_to_host() {
        let r = resolver();
        assert_eq!(r.resolve(&schema(json!({"oneOf": []}))), "host:composed");
        assert_eq!(
            r.resolve(&schema(json!({"allOf": [{"type": "string"}]}))),
            "host:composed"
        );
    }

    #[test]
    fn test_plain_schema_is_exact_pass_through() {
        let r = resolver();
        assert_eq!(r.resolve(&schema(json!({"type": "boolean"}))), "host:boolean");
        assert_eq!(r.resolve(&Schema::default()), "host:none");
    }

    #[test]
    fn test_deep_wrappers_are_capped() {
        let mut value = json!({"type": "string"});
        for _ in 0..(MAX_UNWRAP_DEPTH + 2) {
            value = json!({"nullable": true, "oneOf": [value]});
        }
        assert_eq!(resolver().resolve(&schema(value)), UNTYPED);

        let mut shallow = json!({"type": "string"});
        for _ in 0..3 {
            shallow = json!({"nullable": true, "oneOf": [shallow]});
        }
        assert_eq!(resolver().resolve(&schema(shallow)), "host:string");
    }
}

//! Java-specific operation and model contexts for the Micronaut templates.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::openapi::{OpenApiContext, OpenApiOperation, OpenApiParameter};
use crate::schema::Schema;
use crate::types::TypeResolver;
use crate::utils::{sanitize_javadoc, to_class_name, to_enum_constant, to_var_name};

/// Return type of operations without a successful response body.
pub const VOID: &str = "void";

/// Deepest `allOf` chain merged into a single model.
const MAX_MERGE_DEPTH: usize = 8;

/// Where a parameter travels in the HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl ParameterLocation {
    fn from_in(location: &str) -> Option<Self> {
        match location {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            "body" => Some(Self::Body),
            _ => None,
        }
    }

    /// Micronaut binding annotation for the location.
    pub fn annotation(&self) -> &'static str {
        match self {
            Self::Path => "PathVariable",
            Self::Query => "QueryValue",
            Self::Header => "Header",
            Self::Cookie => "CookieValue",
            Self::Body => "Body",
        }
    }
}

/// A method parameter of a generated client interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JavaParameter {
    /// Java identifier
    pub name: String,
    /// Name on the wire
    pub base_name: String,
    pub data_type: String,
    pub location: ParameterLocation,
    pub annotation: String,
    pub required: bool,
    pub description: Option<String>,
}

/// One client method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationContext {
    pub operation_id: String,
    /// Java method name
    pub nickname: String,
    /// Upper-case HTTP method (`GET`)
    pub http_method: String,
    /// Micronaut method annotation (`Get`)
    pub method_annotation: String,
    pub path: String,
    pub summary: Option<String>,
    /// Description flattened for Javadoc
    pub notes: Option<String>,
    pub deprecated: bool,
    /// Non-body parameters followed by the body parameter
    pub all_params: Vec<JavaParameter>,
    pub body_param: Option<JavaParameter>,
    pub return_type: String,
    pub consumes: Option<String>,
    pub produces: Option<String>,
    /// `x-` extensions of the operation plus one `has{status}` flag per declared response
    pub vendor_extensions: BTreeMap<String, JsonValue>,
}

/// A field of a generated model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelVar {
    pub name: String,
    pub base_name: String,
    pub getter: String,
    pub setter: String,
    pub data_type: String,
    pub required: bool,
    pub nullable: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValue {
    pub name: String,
    /// Java literal
    pub value: String,
}

/// One model class (or enum).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelContext {
    pub name: String,
    pub class_name: String,
    pub package: String,
    pub description: Option<String>,
    pub vars: Vec<ModelVar>,
    pub is_enum: bool,
    pub enum_type: String,
    pub enum_values: Vec<EnumValue>,
}

/// Builds operation and model contexts from a parsed document.
pub struct JavaContextBuilder<'a> {
    spec: &'a OpenApiContext,
    resolver: &'a dyn TypeResolver,
    model_package: String,
}

impl<'a> JavaContextBuilder<'a> {
    pub fn new(
        spec: &'a OpenApiContext,
        resolver: &'a dyn TypeResolver,
        model_package: impl Into<String>,
    ) -> Self {
        Self {
            spec,
            resolver,
            model_package: model_package.into(),
        }
    }

    pub fn build_operation(&self, op: &OpenApiOperation) -> OperationContext {
        let mut all_params = Vec::new();
        let mut body_param = None;

        for param in op.parameters.as_deref().unwrap_or_default() {
            let Some(java_param) = self.build_parameter(param) else {
                log::warn!(
                    "Skipping parameter '{}' of {} with unsupported location '{}'",
                    param.name,
                    op.id,
                    param.in_
                );
                continue;
            };
            if java_param.location == ParameterLocation::Body {
                body_param = Some(java_param);
            } else {
                all_params.push(java_param);
            }
        }

        if body_param.is_none() {
            body_param = self.build_request_body(op);
        }
        if let Some(body) = &body_param {
            all_params.push(body.clone());
        }

        let return_type = self
            .spec
            .success_response_schema(op)
            .map(|schema| self.resolver.resolve(&schema))
            .unwrap_or_else(|| VOID.to_string());

        OperationContext {
            operation_id: op.id.clone(),
            nickname: to_var_name(&op.id),
            http_method: op.method.to_uppercase(),
            method_annotation: to_class_name(&op.method),
            path: op.path.clone(),
            summary: op.summary.as_deref().map(sanitize_javadoc),
            notes: op.description.as_deref().map(sanitize_javadoc),
            deprecated: op.deprecated.unwrap_or(false),
            all_params,
            body_param,
            return_type,
            consumes: request_media_type(op),
            produces: response_media_type(op),
            vendor_extensions: vendor_extensions(op),
        }
    }

    fn build_parameter(&self, param: &OpenApiParameter) -> Option<JavaParameter> {
        let location = ParameterLocation::from_in(&param.in_)?;
        Some(JavaParameter {
            name: to_var_name(&param.name),
            base_name: param.name.clone(),
            data_type: self.resolver.resolve(&param.schema()),
            location,
            annotation: location.annotation().to_string(),
            required: param.is_required(),
            description: param.description.as_deref().map(sanitize_javadoc),
        })
    }

    fn build_request_body(&self, op: &OpenApiOperation) -> Option<JavaParameter> {
        let schema = self.spec.request_body_schema(op)?;
        let request_body = op.request_body.as_ref()?;
        let base_name = schema
            .ref_name()
            .map(to_var_name)
            .unwrap_or_else(|| "requestBody".to_string());

        Some(JavaParameter {
            name: base_name.clone(),
            base_name,
            data_type: self.resolver.resolve(&schema),
            location: ParameterLocation::Body,
            annotation: ParameterLocation::Body.annotation().to_string(),
            required: request_body
                .get("required")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
            description: request_body
                .get("description")
                .and_then(JsonValue::as_str)
                .map(sanitize_javadoc),
        })
    }

    pub fn build_model(&self, name: &str, schema: &Schema) -> ModelContext {
        let class_name = to_class_name(name);

        if !schema.enum_values.is_empty() {
            let enum_type = self.resolver.resolve(schema);
            let mut values: Vec<EnumValue> = schema
                .enum_values
                .iter()
                .filter_map(|value| enum_value(value, &enum_type))
                .collect();
            dedupe_constants(&mut values);
            return ModelContext {
                name: name.to_string(),
                class_name,
                package: self.model_package.clone(),
                description: schema.description.as_deref().map(sanitize_javadoc),
                vars: Vec::new(),
                is_enum: true,
                enum_type,
                enum_values: values,
            };
        }

        let mut properties = Vec::new();
        let mut required = Vec::new();
        self.collect_properties(schema, &mut properties, &mut required, 0);

        let vars = properties
            .iter()
            .map(|(base_name, property)| {
                let var_name = to_var_name(base_name);
                let accessor = to_class_name(base_name);
                ModelVar {
                    name: var_name,
                    base_name: base_name.clone(),
                    getter: format!("get{}", accessor),
                    setter: format!("set{}", accessor),
                    data_type: self.resolver.resolve(property),
                    required: required.contains(base_name),
                    nullable: property.is_nullable(),
                    description: property.description.as_deref().map(sanitize_javadoc),
                }
            })
            .collect();

        ModelContext {
            name: name.to_string(),
            class_name,
            package: self.model_package.clone(),
            description: schema.description.as_deref().map(sanitize_javadoc),
            vars,
            is_enum: false,
            enum_type: String::new(),
            enum_values: Vec::new(),
        }
    }

    /// Own properties plus those of every `allOf` member, first declaration wins.
    fn collect_properties(
        &self,
        schema: &Schema,
        properties: &mut Vec<(String, Schema)>,
        required: &mut Vec<String>,
        depth: usize,
    ) {
        if depth > MAX_MERGE_DEPTH {
            log::warn!("allOf nesting deeper than {}; ignoring the rest", MAX_MERGE_DEPTH);
            return;
        }

        for member in schema.all_of() {
            match member.ref_name() {
                Some(target) => match self.component(target) {
                    Some(parent) => self.collect_properties(&parent, properties, required, depth + 1),
                    None => log::warn!("allOf member {} is not a known component", target),
                },
                None => self.collect_properties(member, properties, required, depth + 1),
            }
        }

        for (name, property) in &schema.properties {
            if !properties.iter().any(|(existing, _)| existing == name) {
                properties.push((name.clone(), property.clone()));
            }
        }
        for name in &schema.required {
            if !required.contains(name) {
                required.push(name.clone());
            }
        }
    }

    fn component(&self, name: &str) -> Option<Schema> {
        [
            format!("{}{}", crate::schema::COMPONENTS_PREFIX, name),
            format!("{}{}", crate::schema::DEFINITIONS_PREFIX, name),
        ]
        .iter()
        .find_map(|pointer| self.spec.resolve_pointer(pointer))
        .map(Schema::from_json)
    }
}

fn enum_value(value: &JsonValue, enum_type: &str) -> Option<EnumValue> {
    match value {
        JsonValue::String(s) => Some(EnumValue {
            name: to_enum_constant(s),
            value: format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        }),
        JsonValue::Number(n) => Some(EnumValue {
            name: to_enum_constant(&format!("number_{}", n)),
            value: number_literal(n, enum_type),
        }),
        JsonValue::Bool(b) => Some(EnumValue {
            name: to_enum_constant(&b.to_string()),
            value: b.to_string(),
        }),
        _ => None,
    }
}

/// Java literal of `n` that fits a constructor parameter of type `enum_type`.
fn number_literal(n: &serde_json::Number, enum_type: &str) -> String {
    match enum_type {
        "Long" => format!("{}L", n),
        "Float" => format!("{}f", n),
        "Double" => format!("{}d", n),
        "java.math.BigDecimal" | "java.math.BigInteger" => {
            format!("new {}(\"{}\")", enum_type, n)
        }
        _ => n.to_string(),
    }
}

/// Suffix repeated constant names (`A_B`, `A_B_2`) so every constant is distinct.
fn dedupe_constants(values: &mut [EnumValue]) {
    let mut seen = HashSet::new();
    for value in values.iter_mut() {
        if seen.insert(value.name.clone()) {
            continue;
        }
        let mut suffix = 2;
        let name = loop {
            let candidate = format!("{}_{}", value.name, suffix);
            if !seen.contains(&candidate) {
                break candidate;
            }
            suffix += 1;
        };
        log::debug!("Enum constant {} repeats; using {}", value.name, name);
        seen.insert(name.clone());
        value.name = name;
    }
}

fn vendor_extensions(op: &OpenApiOperation) -> BTreeMap<String, JsonValue> {
    let mut extensions: BTreeMap<String, JsonValue> = op
        .vendor_extensions
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for status in op.responses.keys() {
        if status.chars().all(|c| c.is_ascii_digit()) {
            extensions.insert(format!("has{}", status), JsonValue::Bool(true));
        }
    }
    extensions
}

fn request_media_type(op: &OpenApiOperation) -> Option<String> {
    let content = op.request_body.as_ref()?.get("content")?.as_object()?;
    preferred_media_type(content.keys().collect())
}

fn response_media_type(op: &OpenApiOperation) -> Option<String> {
    let mut statuses: Vec<&String> = op.responses.keys().filter(|s| s.starts_with('2')).collect();
    statuses.sort();
    statuses.into_iter().find_map(|status| {
        let content = op.responses[status].content.as_ref()?;
        preferred_media_type(content.keys().collect())
    })
}

fn preferred_media_type(media_types: Vec<&String>) -> Option<String> {
    media_types
        .iter()
        .find(|media_type| media_type.contains("json"))
        .or_else(|| media_types.first())
        .map(|media_type| media_type.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FormatTable, JavaTypeMapping, SchemaTypeResolver};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn petstore() -> OpenApiContext {
        OpenApiContext {
            json: json!({
                "openapi": "3.0.0",
                "info": {"title": "Petstore", "version": "1.0.0"},
                "paths": {
                    "/pets/{petId}": {
                        "parameters": [
                            {"name": "petId", "in": "path", "schema": {"type": "string", "format": "uuid"}}
                        ],
                        "get": {
                            "operationId": "getPet",
                            "tags": ["pets"],
                            "summary": "Find a pet",
                            "description": "Returns the pet\n   with the given id",
                            "parameters": [
                                {"name": "X-Trace", "in": "header", "schema": {"type": "string"}}
                            ],
                            "responses": {
                                "200": {
                                    "description": "ok",
                                    "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}
                                },
                                "401": {"description": "unauthorized"}
                            }
                        },
                        "put": {
                            "operationId": "updatePet",
                            "requestBody": {
                                "required": true,
                                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}
                            },
                            "responses": {"204": {"description": "updated"}}
                        }
                    }
                },
                "components": {
                    "schemas": {
                        "Named": {
                            "type": "object",
                            "required": ["name"],
                            "properties": {"name": {"type": "string"}}
                        },
                        "Pet": {
                            "allOf": [
                                {"$ref": "#/components/schemas/Named"},
                                {
                                    "type": "object",
                                    "properties": {
                                        "id": {"type": "string", "format": "uuid"},
                                        "tag": {"type": "string", "nullable": true},
                                        "default": {"type": "integer", "format": "int64"}
                                    }
                                }
                            ]
                        },
                        "Status": {"type": "string", "enum": ["available", "sold-out"]}
                    }
                }
            }),
        }
    }

    fn resolver(spec: &OpenApiContext) -> SchemaTypeResolver {
        SchemaTypeResolver::new(
            FormatTable::with_overrides(&BTreeMap::new()),
            JavaTypeMapping::new().with_components(spec.component_schemas()),
        )
    }

    fn operation(spec: &OpenApiContext, id: &str) -> OpenApiOperation {
        spec.parse_operations()
            .unwrap()
            .into_iter()
            .find(|op| op.id == id)
            .unwrap()
    }

    #[test]
    fn test_build_get_operation() {
        let spec = petstore();
        let resolver = resolver(&spec);
        let builder = JavaContextBuilder::new(&spec, &resolver, "org.openapitools.model");

        let ctx = builder.build_operation(&operation(&spec, "getPet"));
        assert_eq!(ctx.nickname, "getPet");
        assert_eq!(ctx.http_method, "GET");
        assert_eq!(ctx.method_annotation, "Get");
        assert_eq!(ctx.return_type, "Pet");
        assert_eq!(ctx.notes.as_deref(), Some("Returns the pet with the given id"));
        assert_eq!(ctx.produces.as_deref(), Some("application/json"));
        assert_eq!(ctx.vendor_extensions.get("has401"), Some(&json!(true)));
        assert_eq!(ctx.vendor_extensions.get("has200"), Some(&json!(true)));

        let names: Vec<_> = ctx.all_params.iter().map(|p| p.base_name.as_str()).collect();
        assert!(names.contains(&"petId"));
        assert!(names.contains(&"X-Trace"));
        let pet_id = ctx.all_params.iter().find(|p| p.base_name == "petId").unwrap();
        assert_eq!(pet_id.data_type, "java.util.UUID");
        assert_eq!(pet_id.annotation, "PathVariable");
        assert!(pet_id.required);
        let trace = ctx.all_params.iter().find(|p| p.base_name == "X-Trace").unwrap();
        assert_eq!(trace.name, "xTrace");
        assert!(!trace.required);
    }

    #[test]
    fn test_request_body_and_void_return() {
        let spec = petstore();
        let resolver = resolver(&spec);
        let builder = JavaContextBuilder::new(&spec, &resolver, "org.openapitools.model");

        let ctx = builder.build_operation(&operation(&spec, "updatePet"));
        assert_eq!(ctx.return_type, VOID);
        let body = ctx.body_param.as_ref().unwrap();
        assert_eq!(body.name, "pet");
        assert_eq!(body.data_type, "Pet");
        assert!(body.required);
        assert_eq!(ctx.all_params.last(), Some(body));
        assert_eq!(ctx.consumes.as_deref(), Some("application/json"));
        assert!(!ctx.vendor_extensions.contains_key("has401"));
    }

    #[test]
    fn test_swagger2_body_parameter() {
        let spec = OpenApiContext {
            json: json!({
                "swagger": "2.0",
                "paths": {
                    "/pets": {
                        "post": {
                            "operationId": "addPet",
                            "parameters": [
                                {"name": "pet", "in": "body", "required": true, "schema": {"$ref": "#/definitions/Pet"}}
                            ],
                            "responses": {"200": {"description": "ok", "schema": {"type": "array", "items": {"$ref": "#/definitions/Pet"}}}}
                        }
                    }
                },
                "definitions": {"Pet": {"type": "object", "properties": {"name": {"type": "string"}}}}
            }),
        };
        let resolver = resolver(&spec);
        let builder = JavaContextBuilder::new(&spec, &resolver, "m");

        let ctx = builder.build_operation(&operation(&spec, "addPet"));
        assert_eq!(ctx.body_param.as_ref().map(|p| p.data_type.as_str()), Some("Pet"));
        assert_eq!(ctx.return_type, "java.util.List<Pet>");
    }

    #[test]
    fn test_model_merges_all_of() {
        let spec = petstore();
        let resolver = resolver(&spec);
        let builder = JavaContextBuilder::new(&spec, &resolver, "org.openapitools.model");
        let components = spec.component_schemas();

        let pet = builder.build_model("Pet", &components["Pet"]);
        assert_eq!(pet.class_name, "Pet");
        assert_eq!(pet.package, "org.openapitools.model");
        assert!(!pet.is_enum);

        let names: Vec<_> = pet.vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["name", "id", "tag", "_default"]);
        assert!(pet.vars[0].required);
        assert_eq!(pet.vars[1].data_type, "java.util.UUID");
        assert!(pet.vars[2].nullable);
        assert_eq!(pet.vars[3].data_type, "Long");
        assert_eq!(pet.vars[3].getter, "getDefault");
    }

    #[test]
    fn test_enum_model() {
        let spec = petstore();
        let resolver = resolver(&spec);
        let builder = JavaContextBuilder::new(&spec, &resolver, "m");
        let components = spec.component_schemas();

        let status = builder.build_model("Status", &components["Status"]);
        assert!(status.is_enum);
        assert_eq!(status.enum_type, "String");
        assert_eq!(
            status.enum_values,
            vec![
                EnumValue { name: "AVAILABLE".into(), value: "\"available\"".into() },
                EnumValue { name: "SOLD_OUT".into(), value: "\"sold-out\"".into() },
            ]
        );
    }

    #[test]
    fn test_numeric_enum_literals_match_enum_type() {
        let spec = petstore();
        let resolver = resolver(&spec);
        let builder = JavaContextBuilder::new(&spec, &resolver, "m");

        let code = Schema::from_json(&json!({"type": "integer", "format": "int64", "enum": [1, 2]}));
        let code = builder.build_model("Code", &code);
        assert_eq!(code.enum_type, "Long");
        assert_eq!(
            code.enum_values,
            vec![
                EnumValue { name: "NUMBER_1".into(), value: "1L".into() },
                EnumValue { name: "NUMBER_2".into(), value: "2L".into() },
            ]
        );

        let ratio = Schema::from_json(&json!({"type": "number", "enum": [0.5, 1.5]}));
        let ratio = builder.build_model("Ratio", &ratio);
        assert_eq!(ratio.enum_type, "java.math.BigDecimal");
        assert_eq!(ratio.enum_values[0].name, "NUMBER_0_5");
        assert_eq!(ratio.enum_values[0].value, "new java.math.BigDecimal(\"0.5\")");

        let weight = Schema::from_json(&json!({"type": "number", "format": "float", "enum": [2.5]}));
        assert_eq!(builder.build_model("Weight", &weight).enum_values[0].value, "2.5f");

        let small = Schema::from_json(&json!({"type": "integer", "enum": [7]}));
        assert_eq!(builder.build_model("Small", &small).enum_values[0].value, "7");
    }

    #[test]
    fn test_colliding_enum_constants_get_suffixes() {
        let spec = petstore();
        let resolver = resolver(&spec);
        let builder = JavaContextBuilder::new(&spec, &resolver, "m");

        let schema = Schema::from_json(&json!({"type": "string", "enum": ["a-b", "a_b", "a.b", "A_B_2"]}));
        let names: Vec<_> = builder
            .build_model("Sep", &schema)
            .enum_values
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["A_B", "A_B_2", "A_B_3", "A_B_2_2"]);
    }
}

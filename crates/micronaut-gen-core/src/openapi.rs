//! OpenAPI specification parsing and utilities.
//!
//! This module provides functionality for loading and querying OpenAPI specifications.
//! It supports loading from files or URLs, JSON or YAML, and provides convenient
//! accessors for common fields, operations and component schemas.
//!
//! # Examples
//!
//! ```no_run
//! use micronaut_gen_core::openapi::OpenApiContext;
//! use micronaut_gen_core::error::Result;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! // Load an OpenAPI spec from a file
//! let spec = OpenApiContext::from_file("openapi.json").await?;
//!
//! // Access common fields
//! if let Some(title) = spec.title() {
//!     println!("API Title: {}", title);
//! }
//! for operation in spec.parse_operations()? {
//!     println!("{} {}", operation.method, operation.path);
//! }
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::collections::HashMap;
use std::path::Path;

use crate::schema::Schema;
use crate::Error;

// External imports (alphabetized)
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::fs;

/// HTTP methods a path item may declare, in generation order.
pub const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Longest `$ref` chain followed before giving up.
const MAX_REF_HOPS: usize = 16;

/// Represents an OpenAPI specification
#[derive(Debug, serde::Serialize)]
#[serde(transparent)]
pub struct OpenApiContext {
    /// The raw JSON value of the OpenAPI spec
    pub json: JsonValue,
}

impl OpenApiContext {
    /// Create a new OpenApiContext from a file or URL (supports both YAML and JSON)
    pub async fn from_file_or_url<P: AsRef<str>>(location: P) -> crate::Result<Self> {
        let location = location.as_ref();

        if location.starts_with("http://") || location.starts_with("https://") {
            return Self::from_url(location).await;
        }

        Self::from_file(location).await
    }

    /// Create a new OpenApiContext from a file (supports both YAML and JSON)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        Self::parse_content(&content).map_err(|e| {
            Error::openapi(format!(
                "Failed to parse OpenAPI spec at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Create a new OpenApiContext from a URL (supports both YAML and JSON)
    pub async fn from_url(url: &str) -> crate::Result<Self> {
        let response = reqwest::get(url).await?;

        if !response.status().is_success() {
            return Err(Error::openapi(format!(
                "Failed to fetch OpenAPI spec from {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let content = response.text().await?;

        Self::parse_content(&content).map_err(|e| {
            Error::openapi(format!("Failed to parse OpenAPI spec from {}: {}", url, e))
        })
    }

    /// Parse content as either JSON or YAML
    pub fn parse_content(content: &str) -> Result<Self, String> {
        if let Ok(json) = serde_json::from_str(content) {
            return Ok(Self { json });
        }

        if let Ok(json) = serde_yaml::from_str(content) {
            return Ok(Self { json });
        }

        Err("content is neither valid JSON nor YAML".to_string())
    }

    /// Get a reference to the raw JSON value
    pub fn as_json(&self) -> &JsonValue {
        &self.json
    }

    /// Get the title of the API
    pub fn title(&self) -> Option<&str> {
        self.json.get("info")?.get("title")?.as_str()
    }

    /// Get the version of the API
    pub fn version(&self) -> Option<&str> {
        self.json.get("info")?.get("version")?.as_str()
    }

    /// Get the description of the API
    pub fn description(&self) -> Option<&str> {
        self.json.get("info")?.get("description")?.as_str()
    }

    /// Get the base path of the API
    pub fn base_path(&self) -> Option<String> {
        // OpenAPI 3.0+ servers format
        if let Some(url) = self
            .json
            .get("servers")
            .and_then(JsonValue::as_array)
            .and_then(|servers| servers.first())
            .and_then(|server| server.get("url"))
            .and_then(JsonValue::as_str)
        {
            return Some(url.to_string());
        }

        // Swagger 2.0 host + basePath format
        let host = self.json.get("host").and_then(JsonValue::as_str)?;
        let base_path = self
            .json
            .get("basePath")
            .and_then(JsonValue::as_str)
            .unwrap_or("");
        let scheme = match self.json.get("schemes").and_then(JsonValue::as_array) {
            Some(schemes) if schemes.iter().any(|s| s.as_str() == Some("https")) => "https",
            Some(schemes) => schemes.first().and_then(JsonValue::as_str).unwrap_or("https"),
            None => "https",
        };
        Some(format!("{}://{}{}", scheme, host, base_path))
    }

    /// Look up a local reference (`#/components/...`) in the document.
    pub fn resolve_pointer(&self, reference: &str) -> Option<&JsonValue> {
        let pointer = reference.strip_prefix('#')?;
        self.json.pointer(pointer)
    }

    /// Follow `$ref` chains until a non-reference value is reached.
    /// Unresolvable references are returned as-is.
    pub fn deref<'a>(&'a self, value: &'a JsonValue) -> &'a JsonValue {
        let mut current = value;
        for _ in 0..MAX_REF_HOPS {
            let Some(reference) = current.get("$ref").and_then(JsonValue::as_str) else {
                return current;
            };
            match self.resolve_pointer(reference) {
                Some(target) => current = target,
                None => {
                    log::warn!("Unresolvable reference '{}'", reference);
                    return current;
                }
            }
        }
        current
    }

    /// Parse every operation of every path
    pub fn parse_operations(&self) -> crate::Result<Vec<OpenApiOperation>> {
        let paths = self
            .json
            .get("paths")
            .and_then(JsonValue::as_object)
            .ok_or_else(|| Error::openapi("Missing 'paths' object"))?;

        let mut operations = Vec::new();
        for (path, item) in paths {
            let item = self.deref(item);
            for method in HTTP_METHODS {
                let Some(method_item) = item.get(*method).and_then(JsonValue::as_object) else {
                    continue;
                };

                let operation_id = method_item
                    .get("operationId")
                    .and_then(JsonValue::as_str)
                    .map(String::from)
                    .unwrap_or_else(|| {
                        format!(
                            "{}_{}",
                            method,
                            path.trim_start_matches('/')
                                .replace(['/', '{', '}'], "_")
                        )
                    });

                let summary = method_item
                    .get("summary")
                    .and_then(JsonValue::as_str)
                    .map(String::from);
                let description = method_item
                    .get("description")
                    .and_then(JsonValue::as_str)
                    .map(String::from);
                let external_docs = method_item.get("externalDocs").cloned();
                let parameters = self.merge_parameters(
                    self.extract_parameters(item),
                    self.extract_parameters(&JsonValue::Object(method_item.clone())),
                );
                let request_body = method_item
                    .get("requestBody")
                    .map(|body| self.deref(body).clone());
                let responses = self.extract_responses(method_item);
                let callbacks = method_item.get("callbacks").cloned();
                let deprecated = method_item.get("deprecated").and_then(JsonValue::as_bool);
                let security = method_item
                    .get("security")
                    .and_then(JsonValue::as_array)
                    .cloned();
                let servers = method_item
                    .get("servers")
                    .and_then(JsonValue::as_array)
                    .cloned();
                let tags = method_item
                    .get("tags")
                    .and_then(JsonValue::as_array)
                    .map(|arr| {
                        arr.iter()
                            .filter_map(JsonValue::as_str)
                            .map(String::from)
                            .collect()
                    });
                let vendor_extensions = self.extract_vendor_extensions(method_item);

                operations.push(OpenApiOperation {
                    id: operation_id,
                    method: method.to_string(),
                    path: path.clone(),
                    summary,
                    description,
                    external_docs,
                    parameters,
                    request_body,
                    responses,
                    callbacks,
                    deprecated,
                    security,
                    servers,
                    tags,
                    vendor_extensions,
                });
            }
        }
        Ok(operations)
    }

    /// Extract the `parameters` array of a path item or operation, resolving references
    pub fn extract_parameters(&self, item: &JsonValue) -> Option<Vec<OpenApiParameter>> {
        item.get("parameters")
            .and_then(JsonValue::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|param| {
                        let param = self.deref(param);
                        serde_json::from_value(param.clone())
                            .map_err(|e| log::warn!("Skipping unreadable parameter: {}", e))
                            .ok()
                    })
                    .collect::<Vec<OpenApiParameter>>()
            })
    }

    /// Path-level parameters overridden by operation-level ones with the same name and location
    fn merge_parameters(
        &self,
        path_level: Option<Vec<OpenApiParameter>>,
        operation_level: Option<Vec<OpenApiParameter>>,
    ) -> Option<Vec<OpenApiParameter>> {
        match (path_level, operation_level) {
            (None, None) => None,
            (Some(params), None) | (None, Some(params)) => Some(params),
            (Some(path_level), Some(operation_level)) => {
                let mut merged: Vec<OpenApiParameter> = path_level
                    .into_iter()
                    .filter(|p| {
                        !operation_level
                            .iter()
                            .any(|o| o.name == p.name && o.in_ == p.in_)
                    })
                    .collect();
                merged.extend(operation_level);
                Some(merged)
            }
        }
    }

    /// Extract responses from an operation object, resolving references
    pub fn extract_responses(
        &self,
        operation: &serde_json::Map<String, JsonValue>,
    ) -> HashMap<String, OpenApiResponse> {
        operation
            .get("responses")
            .and_then(JsonValue::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(status, response)| {
                        serde_json::from_value(self.deref(response).clone())
                            .ok()
                            .map(|resp| (status.clone(), resp))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Extract vendor extensions from JSON object
    pub fn extract_vendor_extensions(
        &self,
        item: &serde_json::Map<String, JsonValue>,
    ) -> HashMap<String, JsonValue> {
        item.iter()
            .filter(|(k, _)| k.starts_with("x-"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Named schemas of `components.schemas` (or Swagger 2 `definitions`), in document order
    pub fn component_schemas(&self) -> IndexMap<String, Schema> {
        let schemas = self
            .json
            .get("components")
            .and_then(|c| c.get("schemas"))
            .or_else(|| self.json.get("definitions"))
            .and_then(JsonValue::as_object);

        schemas
            .map(|map| {
                map.iter()
                    .map(|(name, value)| (name.clone(), Schema::from_json(value)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Schema of the request body, preferring JSON content
    pub fn request_body_schema(&self, operation: &OpenApiOperation) -> Option<Schema> {
        let content = operation.request_body.as_ref()?.get("content")?;
        Self::media_schema(content).map(Schema::from_json)
    }

    /// Schema of the first successful (2xx) response, preferring JSON content
    pub fn success_response_schema(&self, operation: &OpenApiOperation) -> Option<Schema> {
        let mut statuses: Vec<&String> = operation
            .responses
            .keys()
            .filter(|status| status.starts_with('2'))
            .collect();
        statuses.sort();

        statuses.into_iter().find_map(|status| {
            let response = &operation.responses[status];
            if let Some(schema) = &response.schema {
                return Some(Schema::from_json(schema));
            }
            let content = serde_json::to_value(response.content.as_ref()?).ok()?;
            Self::media_schema(&content).map(Schema::from_json)
        })
    }

    fn media_schema(content: &JsonValue) -> Option<&JsonValue> {
        let content = content.as_object()?;
        let media = content
            .iter()
            .find(|(media_type, _)| media_type.contains("json"))
            .or_else(|| content.iter().next())
            .map(|(_, media)| media)?;
        media.get("schema")
    }
}

/// Parsed OpenAPI operation for template rendering
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenApiOperation {
    /// Unique string used to identify the operation. The id MUST be unique among all operations described in the API.
    #[serde(rename = "operationId")]
    pub id: String,
    /// Lowercase HTTP method (e.g., "get")
    pub method: String,
    /// The path where this operation is defined (e.g., "/pet/findByStatus")
    pub path: String,
    /// A list of tags for API documentation control. Tags can be used for logical grouping of operations.
    #[serde(rename = "tags")]
    pub tags: Option<Vec<String>>,
    /// A short summary of what the operation does.
    pub summary: Option<String>,
    /// A verbose explanation of the operation behavior. CommonMark syntax MAY be used for rich text representation.
    pub description: Option<String>,
    /// Additional external documentation for this operation.
    #[serde(rename = "externalDocs")]
    pub external_docs: Option<serde_json::Value>,
    /// Path-level and operation-level parameters, operation-level taking precedence.
    pub parameters: Option<Vec<OpenApiParameter>>,
    /// The request body applicable for this operation, references resolved.
    #[serde(rename = "requestBody")]
    pub request_body: Option<serde_json::Value>,
    /// The list of possible responses as they are returned from executing this operation.
    pub responses: HashMap<String, OpenApiResponse>,
    /// A map of possible out-of band callbacks related to the parent operation.
    pub callbacks: Option<serde_json::Value>,
    /// Declares this operation to be deprecated. Consumers SHOULD refrain from usage of the declared operation.
    pub deprecated: Option<bool>,
    /// A declaration of which security mechanisms can be used for this operation.
    pub security: Option<Vec<serde_json::Value>>,
    /// An alternative server array to service this operation.
    pub servers: Option<Vec<serde_json::Value>>,
    /// Specification extensions (fields starting with `x-`).
    #[serde(flatten)]
    pub vendor_extensions: HashMap<String, serde_json::Value>,
}

impl OpenApiOperation {
    /// First tag, used to group operations into API classes
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.as_ref()?.first().map(String::as_str)
    }

    pub fn has_response(&self, status: &str) -> bool {
        self.responses.contains_key(status)
    }
}

/// Information about a single parameter in an OpenAPI operation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OpenApiParameter {
    /// The name of the parameter. Parameter names are case sensitive.
    pub name: String,
    /// The location of the parameter. Possible values: "query", "header", "path", "cookie" (and "body" in Swagger 2).
    #[serde(rename = "in")]
    pub in_: String,
    /// A brief description of the parameter. This could contain examples of use. CommonMark syntax MAY be used for rich text representation.
    pub description: Option<String>,
    /// Determines whether this parameter is mandatory. If the parameter location is "path", this property is REQUIRED and its value MUST be true. Otherwise, the property MAY be included and its default value is false.
    pub required: Option<bool>,
    /// Specifies that a parameter is deprecated and SHOULD be transitioned out of usage.
    pub deprecated: Option<bool>,
    /// Sets the ability to pass empty-valued parameters. This is valid only for query parameters and allows sending a parameter with an empty value. Default value is false.
    #[serde(rename = "allowEmptyValue")]
    pub allow_empty_value: Option<bool>,
    /// Describes how the parameter value will be serialized depending on the type of the parameter value.
    pub style: Option<String>,
    /// When this is true, parameter values of type array or object generate separate parameters for each value of the array or key-value pair of the map. Default value is false.
    pub explode: Option<bool>,
    /// The schema defining the type used for the parameter.
    pub schema: Option<serde_json::Value>,
    /// Swagger 2 inline type (`type`/`format`/`items` directly on the parameter).
    #[serde(rename = "type")]
    pub inline_type: Option<String>,
    /// Swagger 2 inline format.
    pub format: Option<String>,
    /// Swagger 2 inline array items.
    pub items: Option<serde_json::Value>,
    /// Example of the parameter's potential value. The example SHOULD match the specified schema and encoding properties if present.
    pub example: Option<serde_json::Value>,
    /// A map containing the representations for the parameter. The key is the media type and the value describes it.
    pub content: Option<HashMap<String, serde_json::Value>>,
}

impl OpenApiParameter {
    /// Whether the parameter must be supplied; path parameters always are
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(self.in_ == "path")
    }

    /// The parameter's schema, whichever way the document declares it
    pub fn schema(&self) -> Schema {
        if let Some(schema) = &self.schema {
            return Schema::from_json(schema);
        }
        if let Some(inline_type) = &self.inline_type {
            let mut inline = serde_json::Map::new();
            inline.insert("type".into(), JsonValue::String(inline_type.clone()));
            if let Some(format) = &self.format {
                inline.insert("format".into(), JsonValue::String(format.clone()));
            }
            if let Some(items) = &self.items {
                inline.insert("items".into(), items.clone());
            }
            return Schema::from_json(&JsonValue::Object(inline));
        }
        self.content
            .as_ref()
            .and_then(|content| content.values().find_map(|media| media.get("schema")))
            .map(Schema::from_json)
            .unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OpenApiResponse {
    /// A short description of the response. CommonMark syntax MAY be used for rich text representation.
    pub description: Option<String>,
    /// Maps a header name to its definition. The key is the name of the header, and the value describes it.
    pub headers: Option<HashMap<String, serde_json::Value>>,
    /// A map containing descriptions of potential response payloads. The key is a media type, and the value describes it.
    pub content: Option<IndexMap<String, serde_json::Value>>,
    /// Swagger 2 response schema.
    pub schema: Option<serde_json::Value>,
    /// Specification extensions (fields starting with `x-`).
    #[serde(flatten)]
    pub vendor_extensions: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn context(json: JsonValue) -> OpenApiContext {
        OpenApiContext { json }
    }

    #[tokio::test]
    async fn test_from_file() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("openapi.json");
        let json_content = r#"
        {
            "openapi": "3.0.0",
            "info": {
                "title": "Test API Async",
                "version": "2.0.0"
            },
            "servers": [
                {
                    "url": "https://api.example.com/v2"
                }
            ]
        }
        "#;
        tokio::fs::write(&file_path, json_content).await?;

        let spec = OpenApiContext::from_file(&file_path).await?;
        assert_eq!(spec.title(), Some("Test API Async"));
        assert_eq!(spec.version(), Some("2.0.0"));
        assert_eq!(
            spec.base_path(),
            Some("https://api.example.com/v2".to_string())
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_from_yaml_file() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("openapi.yaml");
        tokio::fs::write(
            &file_path,
            "openapi: 3.0.0\ninfo:\n  title: Yaml API\n  version: 1.0.0\npaths: {}\n",
        )
        .await?;

        let spec = OpenApiContext::from_file_or_url(file_path.to_string_lossy()).await?;
        assert_eq!(spec.title(), Some("Yaml API"));
        Ok(())
    }

    #[test]
    fn test_unparseable_content() {
        assert!(OpenApiContext::parse_content("{ not: [valid").is_err());
    }

    #[test]
    fn test_swagger2_base_path() {
        let spec = context(json!({
            "host": "petstore.swagger.io",
            "basePath": "/v2",
            "schemes": ["http", "https"]
        }));
        assert_eq!(
            spec.base_path(),
            Some("https://petstore.swagger.io/v2".to_string())
        );
    }

    #[test]
    fn test_parse_operations_all_methods_and_merged_parameters() -> crate::Result<()> {
        let spec = context(json!({
            "paths": {
                "/pets/{petId}": {
                    "parameters": [
                        {"name": "petId", "in": "path", "schema": {"type": "string"}},
                        {"name": "trace", "in": "header", "schema": {"type": "string"}}
                    ],
                    "get": {
                        "operationId": "getPet",
                        "parameters": [
                            {"name": "petId", "in": "path", "schema": {"type": "integer"}}
                        ],
                        "responses": {"200": {"$ref": "#/components/responses/PetResponse"}}
                    },
                    "delete": {
                        "tags": ["pets"],
                        "responses": {"204": {"description": "gone"}}
                    }
                }
            },
            "components": {
                "responses": {
                    "PetResponse": {
                        "description": "a pet",
                        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}
                    }
                }
            }
        }));

        let operations = spec.parse_operations()?;
        assert_eq!(operations.len(), 2);

        let get = &operations[0];
        assert_eq!(get.id, "getPet");
        assert_eq!(get.method, "get");
        let params = get.parameters.clone().unwrap_or_default();
        let names: Vec<_> = params.iter().map(|p| (p.name.as_str(), p.in_.as_str())).collect();
        assert_eq!(names, vec![("trace", "header"), ("petId", "path")]);
        assert_eq!(params[1].schema().primary_type(), Some("integer"));
        assert!(params[1].is_required());
        assert!(!params[0].is_required());

        let response = spec.success_response_schema(get).expect("response schema");
        assert_eq!(response.ref_name(), Some("Pet"));

        let delete = &operations[1];
        assert_eq!(delete.id, "delete_pets__petId_");
        assert_eq!(delete.primary_tag(), Some("pets"));
        assert!(spec.success_response_schema(delete).is_none());
        Ok(())
    }

    #[test]
    fn test_missing_paths() {
        let spec = context(json!({"openapi": "3.0.0"}));
        assert!(matches!(spec.parse_operations(), Err(Error::OpenApi(_))));
    }

    #[test]
    fn test_request_body_schema() -> crate::Result<()> {
        let spec = context(json!({
            "paths": {
                "/pets": {
                    "post": {
                        "operationId": "addPet",
                        "requestBody": {"$ref": "#/components/requestBodies/NewPet"},
                        "responses": {}
                    }
                }
            },
            "components": {
                "requestBodies": {
                    "NewPet": {
                        "content": {
                            "text/plain": {"schema": {"type": "string"}},
                            "application/json": {"schema": {"$ref": "#/components/schemas/NewPet"}}
                        }
                    }
                }
            }
        }));
        let operations = spec.parse_operations()?;
        let body = spec.request_body_schema(&operations[0]).expect("body schema");
        assert_eq!(body.ref_name(), Some("NewPet"));
        Ok(())
    }

    #[test]
    fn test_component_schemas_in_order() {
        let spec = context(json!({
            "components": {"schemas": {"Zebra": {"type": "string"}, "Aardvark": {"type": "object"}}}
        }));
        let names: Vec<_> = spec.component_schemas().keys().cloned().collect();
        assert_eq!(names, vec!["Zebra", "Aardvark"]);

        let swagger = context(json!({"definitions": {"Pet": {"type": "object"}}}));
        assert!(swagger.component_schemas().contains_key("Pet"));
    }

    #[test]
    fn test_swagger2_inline_parameter_schema() {
        let param: OpenApiParameter = serde_json::from_value(json!({
            "name": "ids", "in": "query", "type": "array", "items": {"type": "string", "format": "uuid"}
        }))
        .unwrap();
        let schema = param.schema();
        assert_eq!(schema.primary_type(), Some("array"));
        assert_eq!(
            schema.items.as_deref().and_then(|i| i.format.as_deref()),
            Some("uuid")
        );
    }
}

//! Configuration management for client generation.
//!
//! This module defines the `Config` struct holding every generation setting.
//! The configuration can be loaded from a YAML file, created programmatically,
//! or assembled from command-line arguments.
//!
//! # Examples
//!
//! ```no_run
//! use micronaut_gen_core::config::Config;
//!
//! # #[tokio::main]
//! # async fn main() -> micronaut_gen_core::Result<()> {
//! // Create a new config programmatically
//! let mut config = Config::new("petstore-client", "openapi.yaml", "output");
//! config.invoker_package = "com.example.petstore".to_string();
//! config.generate_auth_parameters = true;
//!
//! // Or load from a config file
//! let config = Config::from_file("micronaut-gen.yaml").await?;
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::collections::BTreeMap;
use std::path::Path;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::fs;
use url::Url;

/// Configuration for client project generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Project name, also used as the Gradle artifact id
    pub project_name: String,

    /// Path or URL of the OpenAPI document
    pub openapi_schema_path: String,

    /// Output directory for the generated project
    pub output_dir: String,

    /// Optional path to the template directory
    #[serde(default)]
    pub template_dir: Option<String>,

    /// Package of the client infrastructure classes
    #[serde(default = "default_invoker_package")]
    pub invoker_package: String,

    /// Package of the generated API interfaces
    #[serde(default = "default_api_package")]
    pub api_package: String,

    /// Package of the generated models
    #[serde(default = "default_model_package")]
    pub model_package: String,

    /// Version written to the generated build script
    #[serde(default = "default_artifact_version")]
    pub artifact_version: String,

    /// Generate authorization parameters for operations with a possible 401 response
    #[serde(default)]
    pub generate_auth_parameters: bool,

    /// List of operations to include (all when empty)
    #[serde(default)]
    pub include_operations: Vec<String>,

    /// List of operations to exclude
    #[serde(default)]
    pub exclude_operations: Vec<String>,

    /// Extra `format` -> type overrides, on top of the built-in ones
    #[serde(default)]
    pub format_mappings: BTreeMap<String, String>,

    /// Overrides of the default Java type mapping (e.g. `DateTime: java.time.Instant`)
    #[serde(default)]
    pub type_mappings: BTreeMap<String, String>,

    /// Free-form options passed to the generator and the templates
    #[serde(default)]
    pub additional_properties: BTreeMap<String, JsonValue>,

    /// Base URL used when the document only declares a relative server
    #[serde(default)]
    pub base_url: Option<Url>,
}

impl Config {
    /// Create a new Config with default values
    pub fn new(
        project_name: impl Into<String>,
        openapi_schema_path: impl Into<String>,
        output_dir: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            openapi_schema_path: openapi_schema_path.into(),
            output_dir: output_dir.into(),
            template_dir: None,
            invoker_package: default_invoker_package(),
            api_package: default_api_package(),
            model_package: default_model_package(),
            artifact_version: default_artifact_version(),
            generate_auth_parameters: false,
            include_operations: Vec::new(),
            exclude_operations: Vec::new(),
            format_mappings: BTreeMap::new(),
            type_mappings: BTreeMap::new(),
            additional_properties: BTreeMap::new(),
            base_url: None,
        }
    }

    /// Load configuration from a file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Whether an operation passes the include/exclude lists
    pub fn includes_operation(&self, operation_id: &str) -> bool {
        let included = self.include_operations.is_empty()
            || self.include_operations.iter().any(|id| id == operation_id);
        let excluded = self.exclude_operations.iter().any(|id| id == operation_id);
        included && !excluded
    }
}

fn default_invoker_package() -> String {
    "org.openapitools".to_string()
}

fn default_api_package() -> String {
    "org.openapitools.api".to_string()
}

fn default_model_package() -> String {
    "org.openapitools.model".to_string()
}

fn default_artifact_version() -> String {
    "0.0.1-SNAPSHOT".to_string()
}

//! Manifest file format for template sets.
//!
//! This module defines the structure of the `manifest.yaml` (or
//! `manifest.toml`) file that describes which templates a template set renders
//! besides the generator's built-in supporting files.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_value::Value as SerdeValue;
use tokio::fs;

/// The root manifest structure for a template set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateManifest {
    /// The name of the template set
    pub name: String,

    /// A short description of what the template set generates
    pub description: String,

    /// The version of the template set (should follow semantic versioning)
    pub version: String,

    /// The target programming language
    pub language: String,

    /// List of files to generate
    #[serde(default)]
    pub files: Vec<TemplateFile>,

    /// Optional hooks that run before/after generation
    #[serde(default)]
    pub hooks: TemplateHooks,
}

/// What a manifest entry is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForEach {
    /// Once per API class (operations grouped by tag)
    Api,
    /// Once per generated model
    Model,
}

/// Describes a single file to be generated from a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateFile {
    /// Path to the template file, relative to the template directory
    pub source: String,

    /// Output file name; may contain `{classname}`
    pub destination: String,

    /// Output folder relative to the output directory
    #[serde(default)]
    pub folder: String,

    /// Package appended to the folder as a path: `invoker`, `api`, `model`
    /// or a literal package name. Per-API and per-model entries default to
    /// the API and model packages.
    #[serde(default)]
    pub package: Option<String>,

    /// Optional directive for generating one file per API or model
    #[serde(default)]
    pub for_each: Option<ForEach>,

    /// Whether an existing file is replaced
    #[serde(default = "default_true")]
    pub overwrite: bool,

    /// Copy the file verbatim instead of rendering it
    #[serde(default)]
    pub copy: bool,

    /// Skip the entry when its template is missing
    #[serde(default)]
    pub optional: bool,

    /// Additional context to pass to the template
    #[serde(default)]
    pub context: serde_json::Value,
}

/// Hooks that run at specific points during code generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateHooks {
    /// Commands to run before code generation
    #[serde(default, deserialize_with = "deserialize_commands")]
    pub pre_generate: Vec<String>,

    /// Commands to run after code generation
    #[serde(default, deserialize_with = "deserialize_commands")]
    pub post_generate: Vec<String>,
}

impl Default for TemplateManifest {
    fn default() -> Self {
        Self {
            name: String::from("default"),
            description: String::from("Default template"),
            version: String::from("0.1.0"),
            language: String::from("java"),
            files: Vec::new(),
            hooks: TemplateHooks::default(),
        }
    }
}

impl TemplateManifest {
    /// Load a template manifest from a directory.
    ///
    /// Looks for `manifest.yaml`, then `manifest.toml`; a directory without a
    /// manifest gets the default (empty) one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or contains invalid YAML/TOML.
    pub async fn load_from_dir(template_dir: &Path) -> crate::Result<Self> {
        let yaml_path = template_dir.join("manifest.yaml");
        let toml_path = template_dir.join("manifest.toml");

        if yaml_path.exists() {
            log::debug!("Reading template manifest from {}", yaml_path.display());
            let content = fs::read_to_string(&yaml_path).await?;
            return serde_yaml::from_str(&content).map_err(|e| {
                crate::Error::template(format!(
                    "Invalid YAML in template manifest at {}: {}",
                    yaml_path.display(),
                    e
                ))
            });
        }

        if toml_path.exists() {
            log::debug!("Reading template manifest from {}", toml_path.display());
            let content = fs::read_to_string(&toml_path).await?;
            return Ok(toml::from_str(&content)?);
        }

        log::debug!(
            "No manifest in {}; using the default manifest",
            template_dir.display()
        );
        Ok(Self::default())
    }
}

fn default_true() -> bool {
    true
}

/// Helper function to deserialize either a single command or a list of commands
fn deserialize_commands<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = SerdeValue::deserialize(deserializer)?;

    match value {
        SerdeValue::String(s) => Ok(vec![s]),
        SerdeValue::Seq(seq) => seq
            .into_iter()
            .map(|item| match item {
                SerdeValue::String(s) => Ok(s),
                _ => Err(serde::de::Error::custom(
                    "Expected string or array of strings",
                )),
            })
            .collect(),
        _ => Err(serde::de::Error::custom(
            "Expected string or array of strings",
        )),
    }
}

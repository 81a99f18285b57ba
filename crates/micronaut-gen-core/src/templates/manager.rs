//! Template system for code generation

// Internal imports (std, crate)
use std::{
    error::Error as StdError,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::{Error, Result},
    generator::MicronautClientGenerator,
    manifest::{ForEach, TemplateFile, TemplateManifest},
    openapi::OpenApiContext,
    supporting::{SupportingFile, SupportingFileKind},
};

use super::TemplateDir;

// External imports (alphabetized)
use serde::Serialize;
use serde_json::{json, Map, Value as JsonValue};
use tera::{Context, Tera};

/// Files touched by one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Files written, in generation order
    pub written: Vec<PathBuf>,
    /// Existing files left alone and optional templates that were missing
    pub skipped: Vec<PathBuf>,
}

/// Manages loading and rendering of code generation templates
#[derive(Debug, Clone)]
pub struct TemplateManager {
    /// Cached Tera template engine instance
    tera: Arc<Tera>,
    /// Template directory
    template_dir: TemplateDir,
    /// The template manifest
    manifest: TemplateManifest,
}

impl TemplateManager {
    /// Create a new TemplateManager for the named template set
    ///
    /// # Arguments
    /// * `name` - The template set to use (normally the generator name)
    /// * `template_dir` - Optional path to the template set or to the directory holding it.
    ///   If None, the standard locations are searched.
    ///
    /// # Returns
    /// A new `TemplateManager` instance or an error if the template directory cannot be found or loaded.
    pub async fn new(name: &str, template_dir: Option<PathBuf>) -> Result<Self> {
        let template_dir = TemplateDir::discover(name, template_dir.as_deref())?;

        let template_path = template_dir.template_path();
        let template_dir_str = template_path.to_str().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "Template path contains invalid UTF-8",
            )
        })?;

        let manifest = TemplateManifest::load_from_dir(template_path).await?;

        // Only `.tera` files are templates; scripts and binaries are copied as they are
        let tera = Tera::new(&format!("{}/**/*.tera", template_dir_str)).map_err(|e| {
            log::error!("Failed to parse templates in {}: {}", template_dir_str, e);
            Error::Tera(e)
        })?;

        log::debug!(
            "Loaded template set '{}' ({} templates) from {}",
            manifest.name,
            tera.get_template_names().count(),
            template_dir.display()
        );

        Ok(TemplateManager {
            tera: Arc::new(tera),
            template_dir,
            manifest,
        })
    }

    /// Get the template directory
    pub fn template_dir(&self) -> &TemplateDir {
        &self.template_dir
    }

    /// Get the template set path
    pub fn template_dir_path(&self) -> &Path {
        self.template_dir.template_path()
    }

    /// Get a reference to the Tera instance
    pub fn tera(&self) -> &Tera {
        &self.tera
    }

    /// Get the template manifest
    pub fn manifest(&self) -> &TemplateManifest {
        &self.manifest
    }

    /// Check if a template exists
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template(name).is_ok()
    }

    /// List the manifest entries whose template is available
    pub fn list_templates(&self) -> Vec<(String, String)> {
        self.manifest
            .files
            .iter()
            .filter(|f| self.has_template(&f.source) || self.template_file_exists(&f.source))
            .map(|f| (f.source.clone(), f.destination.clone()))
            .collect()
    }

    fn template_file_exists(&self, name: &str) -> bool {
        self.template_dir_path().join(name).is_file()
    }

    /// Render a template with a JSON object as its context
    pub fn render(&self, template_name: &str, context: &JsonValue) -> Result<String> {
        let tera_context = Context::from_value(context.clone())?;
        self.tera.render(template_name, &tera_context).map_err(|e| {
            log::error!("Template rendering failed for '{}': {}", template_name, e);
            let mut source = StdError::source(&e);
            while let Some(cause) = source {
                log::error!("  caused by: {}", cause);
                source = cause.source();
            }
            Error::Tera(e)
        })
    }

    /// Generate the client project described by the document into `output_dir`.
    ///
    /// The generator must have processed its options and loaded the
    /// document's components.
    pub async fn generate(
        &self,
        spec: &OpenApiContext,
        generator: &MicronautClientGenerator,
        output_dir: &Path,
    ) -> Result<GenerationReport> {
        tokio::fs::create_dir_all(output_dir).await?;
        let mut report = GenerationReport::default();

        self.execute_hooks("pre-generation", &self.manifest.hooks.pre_generate, output_dir)
            .await?;

        let mut base_context = generator.template_context(spec);
        let models = generator.models(spec);
        let apis = generator.apis(spec)?;
        log::info!(
            "Generating {} APIs and {} models into {}",
            apis.len(),
            models.len(),
            output_dir.display()
        );

        if let JsonValue::Object(map) = &mut base_context {
            map.insert("has_models".to_string(), JsonValue::Bool(!models.is_empty()));
            map.insert("models".to_string(), serde_json::to_value(&models)?);
            map.insert("apis".to_string(), serde_json::to_value(&apis)?);
        }

        for file in &self.manifest.files {
            match file.for_each {
                Some(ForEach::Model) => {
                    for model in &models {
                        let item = json!({
                            "classname": model.class_name,
                            "package": model.package,
                            "model": model,
                        });
                        self.process_item_file(file, generator, "model", &base_context, item, output_dir, &mut report)
                            .await?;
                    }
                }
                Some(ForEach::Api) => {
                    for api in &apis {
                        let item = json!({
                            "classname": api.class_name,
                            "package": api.package,
                            "api": api,
                            "operations": api.operations,
                        });
                        self.process_item_file(file, generator, "api", &base_context, item, output_dir, &mut report)
                            .await?;
                    }
                }
                None => {}
            }
        }

        for file in generator.supporting_files().iter() {
            let context = Self::create_file_context(&base_context, &file.context);
            self.process_supporting_file(file, &context, generator, output_dir, &mut report)
                .await?;
        }

        self.execute_hooks("post-generation", &self.manifest.hooks.post_generate, output_dir)
            .await?;

        log::info!(
            "Wrote {} files ({} skipped)",
            report.written.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_item_file(
        &self,
        file: &TemplateFile,
        generator: &MicronautClientGenerator,
        default_package: &str,
        base_context: &JsonValue,
        item: JsonValue,
        output_dir: &Path,
        report: &mut GenerationReport,
    ) -> Result<()> {
        let class_name = item
            .get("classname")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        let folder = generator.output_folder(
            &file.folder,
            Some(file.package.as_deref().unwrap_or(default_package)),
        );
        let supporting = SupportingFile {
            template: file.source.clone(),
            folder,
            destination: file.destination.replace("{classname}", class_name),
            kind: if file.copy {
                SupportingFileKind::Copy
            } else {
                SupportingFileKind::Render
            },
            overwrite: file.overwrite,
            optional: file.optional,
            context: file.context.clone(),
        };

        let context = Self::create_file_context(
            &Self::create_file_context(base_context, &item),
            &file.context,
        );
        self.process_supporting_file(&supporting, &context, generator, output_dir, report)
            .await
    }

    /// Render or copy one file and let the generator post-process it
    async fn process_supporting_file(
        &self,
        file: &SupportingFile,
        context: &JsonValue,
        generator: &MicronautClientGenerator,
        output_dir: &Path,
        report: &mut GenerationReport,
    ) -> Result<()> {
        let output_path = output_dir.join(file.relative_path());
        log::debug!("Processing file: {} -> {}", file.template, output_path.display());

        let contents = match file.kind {
            SupportingFileKind::Render if self.has_template(&file.template) => {
                Some(self.render(&file.template, context)?.into_bytes())
            }
            SupportingFileKind::Copy if self.template_file_exists(&file.template) => {
                Some(tokio::fs::read(self.template_dir_path().join(&file.template)).await?)
            }
            _ => None,
        };

        let Some(contents) = contents else {
            if file.optional {
                log::warn!(
                    "Optional template {} not found in {}; skipping {}",
                    file.template,
                    self.template_dir.display(),
                    output_path.display()
                );
                report.skipped.push(output_path);
                return Ok(());
            }
            return Err(Error::template(format!(
                "Template not found: {} (in {})",
                file.template,
                self.template_dir.display()
            )));
        };

        if self.write_output(&output_path, &contents, file.overwrite).await? {
            generator.post_process_file(&output_path).await?;
            report.written.push(output_path);
        } else {
            report.skipped.push(output_path);
        }
        Ok(())
    }

    /// Write a generated file, creating parent directories.
    /// Returns false when an existing file must not be overwritten.
    pub async fn write_output(&self, path: &Path, contents: &[u8], overwrite: bool) -> Result<bool> {
        if !overwrite && tokio::fs::try_exists(path).await? {
            log::info!("Keeping existing file {}", path.display());
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                log::error!("Failed to create directory {}: {}", parent.display(), e);
                e
            })?;
        }
        tokio::fs::write(path, contents).await.map_err(|e| {
            log::error!("Failed to write file {}: {}", path.display(), e);
            e
        })?;
        log::debug!("Wrote {}", path.display());
        Ok(true)
    }

    /// Run manifest hook commands through `sh -c` in the output directory
    pub async fn execute_hooks(
        &self,
        stage: &str,
        commands: &[String],
        output_path: &Path,
    ) -> Result<()> {
        use tokio::process::Command as AsyncCommand;

        for command in commands {
            log::info!("Running {} hook: {}", stage, command);
            let output = AsyncCommand::new("sh")
                .arg("-c")
                .arg(command)
                .current_dir(output_path)
                .output()
                .await
                .map_err(|e| {
                    io::Error::new(
                        io::ErrorKind::Other,
                        format!("Failed to execute {} hook '{}': {}", stage, command, e),
                    )
                })?;

            if !output.status.success() {
                return Err(Error::template(format!(
                    "{} hook '{}' failed with status {}\n{}{}",
                    stage,
                    command,
                    output.status,
                    String::from_utf8_lossy(&output.stderr),
                    String::from_utf8_lossy(&output.stdout)
                )));
            }
        }
        Ok(())
    }

    /// Merge base context with extra variables, giving precedence to the extra keys
    pub fn create_file_context(base_context: &JsonValue, extra: &JsonValue) -> JsonValue {
        let mut context = match extra {
            JsonValue::Object(extra) => extra.clone(),
            _ => Map::new(),
        };
        if let JsonValue::Object(base_map) = base_context {
            for (k, v) in base_map {
                if !context.contains_key(k) {
                    context.insert(k.clone(), v.clone());
                }
            }
        }
        JsonValue::Object(context)
    }
}

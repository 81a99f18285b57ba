//! The Micronaut client generator.
//!
//! [`MicronautClientGenerator`] owns everything that is specific to the
//! Micronaut client flavour: its options, the Gradle project scaffolding, the
//! `src/main` and `src/test` layout, the Java type mapping and the
//! per-operation tweaks applied before templates see an operation.
//!
//! The [`TemplateManager`](crate::templates::TemplateManager) drives it:
//!
//! ```no_run
//! use micronaut_gen_core::{Config, MicronautClientGenerator, OpenApiContext};
//!
//! # async fn run() -> micronaut_gen_core::Result<()> {
//! let spec = OpenApiContext::from_file("openapi.yaml").await?;
//! let mut generator = MicronautClientGenerator::new(Config::new("petstore", "openapi.yaml", "out"));
//! generator.process_opts();
//! generator.load_components(&spec);
//! for api in generator.apis(&spec)? {
//!     println!("{} ({} operations)", api.class_name, api.operations.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use url::Url;

use crate::builders::{ApiContext, JavaContextBuilder, ModelContext, OperationContext};
use crate::config::Config;
use crate::layout::{
    FolderPolicy, GeneratedSourcesRedirect, OutputFolders, GENERATED_SOURCE_FOLDER,
};
use crate::manifest::TemplateManifest;
use crate::openapi::{OpenApiContext, OpenApiOperation};
use crate::supporting::{SupportingFile, SupportingFiles};
use crate::types::{FormatTable, JavaTypeMapping, SchemaTypeResolver};
use crate::utils::package_path;

/// Name under which the generator and its template set are known.
pub const GENERATOR_NAME: &str = "micronaut";

/// Option enabling authorization parameters on operations that may answer 401.
pub const GENERATE_AUTH_PARAMETERS: &str = "generateAuthParameters";

pub const NULLABLE_ANNOTATION: &str = "io.micronaut.core.annotation.Nullable";
pub const NONNULL_ANNOTATION: &str = "io.micronaut.core.annotation.NonNull";

const GRADLE_WRAPPER_FOLDER: &str = "gradle/wrapper";

/// Kind of artifact a generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodegenType {
    Client,
    Server,
    Documentation,
}

/// A generator option, as listed by `--help`-style output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CliOption {
    pub name: &'static str,
    pub description: &'static str,
    pub default: &'static str,
}

/// Where the generated clients send their requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientEndpoint {
    /// Absolute service URL, when the document (or config) names one
    pub url: Option<String>,
    /// Path prefix without a trailing slash; empty for the root
    pub base_path: String,
}

pub struct MicronautClientGenerator {
    config: Config,
    source_folders: OutputFolders,
    test_folders: OutputFolders,
    folder_policy: Box<dyn FolderPolicy>,
    additional_properties: BTreeMap<String, JsonValue>,
    generate_auth_parameters: bool,
    resolver: SchemaTypeResolver,
    supporting_files: SupportingFiles,
    post_process: bool,
}

impl MicronautClientGenerator {
    pub fn new(config: Config) -> Self {
        let source_folders = OutputFolders::new("src/main");
        let test_folders = OutputFolders::new("src/test");
        let folder_policy =
            GeneratedSourcesRedirect::new(source_folders.clone(), test_folders.clone());

        // User mappings may replace the annotations.
        let mut type_mappings = BTreeMap::from([
            ("Nullable".to_string(), NULLABLE_ANNOTATION.to_string()),
            ("Nonnull".to_string(), NONNULL_ANNOTATION.to_string()),
        ]);
        type_mappings.extend(config.type_mappings.clone());
        let resolver = SchemaTypeResolver::new(
            FormatTable::with_overrides(&config.format_mappings),
            JavaTypeMapping::with_overrides(&type_mappings),
        );

        let mut additional_properties = config.additional_properties.clone();
        if config.generate_auth_parameters {
            additional_properties
                .entry(GENERATE_AUTH_PARAMETERS.to_string())
                .or_insert(JsonValue::Bool(true));
        }

        Self {
            config,
            source_folders,
            test_folders,
            folder_policy: Box::new(folder_policy),
            additional_properties,
            generate_auth_parameters: false,
            resolver,
            supporting_files: SupportingFiles::new(),
            post_process: false,
        }
    }

    /// Replace the supporting-file folder policy.
    pub fn with_folder_policy(mut self, policy: impl FolderPolicy + 'static) -> Self {
        self.folder_policy = Box::new(policy);
        self
    }

    pub fn name(&self) -> &'static str {
        GENERATOR_NAME
    }

    pub fn tag(&self) -> CodegenType {
        CodegenType::Client
    }

    pub fn help(&self) -> &'static str {
        "Generates a Micronaut HTTP client library."
    }

    pub fn cli_options(&self) -> Vec<CliOption> {
        vec![CliOption {
            name: GENERATE_AUTH_PARAMETERS,
            description: "Generate authorization parameters for methods that have a possible 401 response.",
            default: "false",
        }]
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source_folders(&self) -> &OutputFolders {
        &self.source_folders
    }

    pub fn test_folders(&self) -> &OutputFolders {
        &self.test_folders
    }

    pub fn resolver(&self) -> &SchemaTypeResolver {
        &self.resolver
    }

    pub fn supporting_files(&self) -> &SupportingFiles {
        &self.supporting_files
    }

    pub fn additional_properties(&self) -> &BTreeMap<String, JsonValue> {
        &self.additional_properties
    }

    pub fn generate_auth_parameters(&self) -> bool {
        self.generate_auth_parameters
    }

    /// Read the generator options and register the project scaffolding.
    pub fn process_opts(&mut self) {
        self.generate_auth_parameters =
            self.convert_property_to_bool_and_write_back(GENERATE_AUTH_PARAMETERS);
        self.populate_supporting_files();
        self.post_process = true;

        log::debug!(
            "Micronaut client options: {}={}, sources in {}, tests in {}",
            GENERATE_AUTH_PARAMETERS,
            self.generate_auth_parameters,
            self.source_folders.source,
            self.test_folders.source
        );
    }

    /// Read a boolean option, storing the parsed value back so that
    /// templates see a boolean rather than a string.
    fn convert_property_to_bool_and_write_back(&mut self, key: &str) -> bool {
        let value = match self.additional_properties.get(key) {
            None => return false,
            Some(JsonValue::Bool(value)) => *value,
            Some(JsonValue::String(value)) => value.trim().eq_ignore_ascii_case("true"),
            Some(other) => {
                log::warn!("Option {} expects a boolean, got {}; using false", key, other);
                false
            }
        };
        self.additional_properties
            .insert(key.to_string(), JsonValue::Bool(value));
        value
    }

    fn populate_supporting_files(&mut self) {
        self.add_supporting_file(SupportingFile::render("project/README.md.tera", "", "README.md"));
        self.add_supporting_file(
            SupportingFile::render("project/gitignore.tera", "", ".gitignore").do_not_overwrite(),
        );
        self.add_supporting_file(
            SupportingFile::render("project/tool-versions.tera", "", ".tool-versions")
                .do_not_overwrite(),
        );
        self.add_supporting_file(SupportingFile::render(
            "project/build.gradle.kts.tera",
            "",
            "build.gradle.kts",
        ));
        self.add_supporting_file(SupportingFile::render(
            "project/settings.gradle.kts.tera",
            "",
            "settings.gradle.kts",
        ));
        self.add_supporting_file(SupportingFile::copy("project/gradlew", "", "gradlew"));
        self.add_supporting_file(SupportingFile::copy("project/gradlew.bat", "", "gradlew.bat"));
        self.add_supporting_file(SupportingFile::render(
            "project/gradle-wrapper.properties.tera",
            GRADLE_WRAPPER_FOLDER,
            "gradle-wrapper.properties",
        ));
        self.add_supporting_file(
            SupportingFile::copy(
                "project/gradle-wrapper.jar",
                GRADLE_WRAPPER_FOLDER,
                "gradle-wrapper.jar",
            )
            .optional(),
        );

        let invoker = self.source_folder(&self.config.invoker_package);
        for class in ["Client", "NonNullApi", "NonNullFields"] {
            self.add_supporting_file(SupportingFile::render(
                format!("source/{}.java.tera", class),
                invoker.clone(),
                format!("{}.java", class),
            ));
        }
        let api = self.source_folder(&self.config.api_package);
        self.add_supporting_file(SupportingFile::render(
            "source/package-info.java.tera",
            api,
            "package-info.java",
        ));
    }

    fn source_folder(&self, package: &str) -> String {
        self.output_folder(GENERATED_SOURCE_FOLDER, Some(package))
    }

    /// Register a supporting file; repeated registrations are ignored.
    pub fn add_supporting_file(&mut self, file: SupportingFile) -> bool {
        self.supporting_files.add(file)
    }

    /// Register the manifest entries that are rendered once per project.
    pub fn register_manifest_files(&mut self, manifest: &TemplateManifest) {
        for file in manifest.files.iter().filter(|f| f.for_each.is_none()) {
            let folder = self.output_folder(&file.folder, file.package.as_deref());
            let supporting = if file.copy {
                SupportingFile::copy(&file.source, folder, &file.destination)
            } else {
                SupportingFile::render(&file.source, folder, &file.destination)
            };
            let mut supporting = supporting.with_context(file.context.clone());
            supporting.overwrite = file.overwrite;
            supporting.optional = file.optional;
            self.add_supporting_file(supporting);
        }
    }

    /// Folder a file lands in: the policy-resolved folder, followed by the
    /// package as a path when one is given.
    pub fn output_folder(&self, folder: &str, package: Option<&str>) -> String {
        let base = self.folder_policy.resolve(folder);
        let Some(package) = package else {
            return base;
        };
        let package = package_path(&self.package_name(package));
        match base.trim_end_matches('/') {
            "" => package,
            base => format!("{}/{}", base, package),
        }
    }

    /// `invoker`, `api` and `model` name the configured packages.
    pub fn package_name(&self, package: &str) -> String {
        match package {
            "invoker" => self.config.invoker_package.clone(),
            "api" => self.config.api_package.clone(),
            "model" => self.config.model_package.clone(),
            other => other.to_string(),
        }
    }

    /// Make the document's component schemas available to `$ref` resolution.
    pub fn load_components(&mut self, spec: &OpenApiContext) {
        let components = spec.component_schemas();
        log::debug!("Loaded {} component schemas", components.len());
        self.resolver = SchemaTypeResolver::new(
            self.resolver.formats().clone(),
            self.resolver.host().clone().with_components(components),
        );
    }

    pub fn from_operation(&self, spec: &OpenApiContext, op: &OpenApiOperation) -> OperationContext {
        let builder = JavaContextBuilder::new(spec, &self.resolver, &self.config.model_package);
        let mut operation = builder.build_operation(op);

        if !self.generate_auth_parameters {
            // Every declared status gets a `has{status}` flag; 401 only matters with auth parameters.
            operation.vendor_extensions.remove("has401");
        }

        operation
    }

    /// Client interfaces for the operations passing the include/exclude lists.
    pub fn apis(&self, spec: &OpenApiContext) -> crate::Result<Vec<ApiContext>> {
        let operations = spec
            .parse_operations()?
            .into_iter()
            .filter(|op| self.config.includes_operation(&op.id))
            .map(|op| {
                let tag = op.primary_tag().map(str::to_string);
                (tag, self.from_operation(spec, &op))
            })
            .collect();
        Ok(ApiContext::group(operations, &self.config.api_package))
    }

    /// Model classes for the component schemas that need one.
    pub fn models(&self, spec: &OpenApiContext) -> Vec<ModelContext> {
        let builder = JavaContextBuilder::new(spec, &self.resolver, &self.config.model_package);
        spec.component_schemas()
            .iter()
            .filter(|(_, schema)| schema.is_model())
            .map(|(name, schema)| builder.build_model(name, schema))
            .collect()
    }

    /// Shared variables of every template.
    pub fn template_context(&self, spec: &OpenApiContext) -> JsonValue {
        let host = self.resolver.host();
        let endpoint = self.client_endpoint(spec);
        let client_url = endpoint.url.as_ref().map(|url| {
            format!(
                "${{micronaut.http.services.{}.url:{}}}",
                self.config.project_name, url
            )
        });
        let mut context = json!({
            "generator_name": GENERATOR_NAME,
            "project_name": self.config.project_name,
            "artifact_version": self.config.artifact_version,
            "invoker_package": self.config.invoker_package,
            "api_package": self.config.api_package,
            "model_package": self.config.model_package,
            "app_name": spec.title().unwrap_or(&self.config.project_name),
            "app_version": spec.version().unwrap_or("1.0.0"),
            "app_description": spec.description().map(crate::utils::sanitize_javadoc),
            "base_path": endpoint.base_path,
            "server_url": endpoint.url,
            "client_url": client_url,
            "source_folder": self.source_folders.source,
            "test_folder": self.test_folders.source,
            "nullable_annotation": host.mapped("Nullable"),
            "nonnull_annotation": host.mapped("Nonnull"),
            "generate_auth_parameters": self.generate_auth_parameters,
        });
        if let JsonValue::Object(map) = &mut context {
            for (key, value) in &self.additional_properties {
                map.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        context
    }

    /// Base URL of the generated client.
    ///
    /// A relative server URL is joined onto the configured base URL; without
    /// one it is used as-is.
    pub fn client_base_url(&self, spec: &OpenApiContext) -> Option<String> {
        let Some(server) = spec.base_path() else {
            return self.config.base_url.as_ref().map(Url::to_string);
        };
        if Url::parse(&server).is_ok() {
            return Some(server);
        }
        match &self.config.base_url {
            Some(base) => match base.join(&server) {
                Ok(joined) => Some(joined.to_string()),
                Err(e) => {
                    log::warn!("Cannot join server URL {} onto {}: {}", server, base, e);
                    Some(base.to_string())
                }
            },
            None => {
                log::warn!(
                    "Server URL {} is relative and no base URL is configured; using it as-is",
                    server
                );
                Some(server)
            }
        }
    }

    /// [`client_base_url`](Self::client_base_url) split for `@Client`: the
    /// service URL (scheme, host and port) and the path prefix of every request.
    pub fn client_endpoint(&self, spec: &OpenApiContext) -> ClientEndpoint {
        let Some(base) = self.client_base_url(spec) else {
            return ClientEndpoint::default();
        };
        match Url::parse(&base) {
            Ok(url) if url.has_host() => ClientEndpoint {
                url: Some(url.origin().ascii_serialization()),
                base_path: url.path().trim_end_matches('/').to_string(),
            },
            _ => ClientEndpoint {
                url: None,
                base_path: base.trim_end_matches('/').to_string(),
            },
        }
    }

    /// Adjust a file after it was written.
    pub async fn post_process_file(&self, path: &Path) -> crate::Result<()> {
        if !self.post_process {
            return Ok(());
        }
        if path.file_name().and_then(|name| name.to_str()) == Some("gradlew") {
            make_executable(path).await?;
        }
        Ok(())
    }
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> crate::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = tokio::fs::metadata(path).await?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    tokio::fs::set_permissions(path, permissions).await?;
    log::debug!("Marked {} as executable", path.display());
    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> crate::Result<()> {
    Ok(())
}

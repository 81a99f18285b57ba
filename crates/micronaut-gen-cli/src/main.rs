//! micronaut-gen CLI entrypoint
//! Parses command-line arguments and dispatches to the core generator.

// Internal imports (std, crate)
use std::path::{Path, PathBuf};

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use dialoguer::Confirm;
use micronaut_gen_core::{generate, Config, MicronautClientGenerator};
use serde_json::Value as JsonValue;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_CONFIG_FILE: &str = "micronaut-gen.yaml";
const DEFAULT_PROJECT_NAME: &str = "openapi-client";

#[derive(Parser)]
#[command(name = "micronaut-gen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate a Micronaut client project from an OpenAPI document
    Generate(GenerateArgs),
    /// Write a starter configuration file
    Init {
        /// Where to write the configuration
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
        /// Path or URL of the OpenAPI document
        #[arg(long, default_value = "openapi.yaml")]
        schema_path: String,
        /// Project name
        #[arg(long, default_value = DEFAULT_PROJECT_NAME)]
        project_name: String,
        /// Overwrite an existing file without asking
        #[arg(long)]
        force: bool,
    },
    /// List the options understood by the generator
    ConfigHelp,
}

/// Flags of `generate`; each one overrides the configuration file
#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Path or URL to the OpenAPI document (YAML or JSON)
    ///
    /// Example: --schema-path path/to/openapi.yaml
    /// Example: --schema-path https://example.com/openapi.json
    #[arg(long)]
    schema_path: Option<String>,
    /// Project name, also the Gradle artifact id
    #[arg(long)]
    project_name: Option<String>,
    /// Output directory (default: the project name)
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Directory holding the `micronaut` template set
    #[arg(long)]
    template_dir: Option<PathBuf>,
    #[arg(long)]
    invoker_package: Option<String>,
    #[arg(long)]
    api_package: Option<String>,
    #[arg(long)]
    model_package: Option<String>,
    /// Generate authorization parameters for operations with a possible 401 response
    #[arg(long)]
    generate_auth_parameters: bool,
    /// Base URL used when the document only declares a relative server
    #[arg(long)]
    base_url: Option<Url>,
    /// Only generate these operations (comma-separated operation ids)
    #[arg(long, value_delimiter = ',')]
    include_operations: Vec<String>,
    /// Skip these operations (comma-separated operation ids)
    #[arg(long, value_delimiter = ',')]
    exclude_operations: Vec<String>,
    /// Map a schema format to a Java type, e.g. `money=org.javamoney.moneta.Money`
    #[arg(long = "format-mapping", value_parser = parse_key_value)]
    format_mappings: Vec<(String, String)>,
    /// Override a Java type mapping, e.g. `DateTime=java.time.Instant`
    #[arg(long = "type-mapping", value_parser = parse_key_value)]
    type_mappings: Vec<(String, String)>,
    /// Generator option, e.g. `generateAuthParameters=true`
    #[arg(long = "additional-property", value_parser = parse_key_value)]
    additional_properties: Vec<(String, String)>,
}

fn parse_key_value(value: &str) -> Result<(String, String), String> {
    let (key, value) = value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", value))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{}={}'", key, value));
    }
    Ok((key.trim().to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => {
            let config = build_config(&args).await?;
            tracing::info!(
                "Generating {} from {} into {}",
                config.project_name,
                config.openapi_schema_path,
                config.output_dir
            );

            let report = generate(&config)
                .await
                .with_context(|| format!("Failed to generate client from {}", config.openapi_schema_path))?;

            for path in &report.skipped {
                tracing::debug!("Skipped {}", path.display());
            }
            tracing::info!(
                "Generated {} files in {}",
                report.written.len(),
                config.output_dir
            );
        }
        Commands::Init {
            path,
            schema_path,
            project_name,
            force,
        } => {
            if path.exists() && !force && !confirm_overwrite(&path)? {
                tracing::info!("Keeping existing {}", path.display());
                return Ok(());
            }
            write_starter_config(&path, &project_name, &schema_path).await?;
            tracing::info!("Wrote {}", path.display());
        }
        Commands::ConfigHelp => {
            let generator = MicronautClientGenerator::new(Config::new("", "", ""));
            println!("{}: {}", generator.name(), generator.help());
            for option in generator.cli_options() {
                println!(
                    "  {} (default: {})\n      {}",
                    option.name, option.default, option.description
                );
            }
        }
    }
    Ok(())
}

fn confirm_overwrite(path: &Path) -> anyhow::Result<bool> {
    Confirm::new()
        .with_prompt(format!("{} already exists. Overwrite?", path.display()))
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

async fn write_starter_config(path: &Path, project_name: &str, schema_path: &str) -> anyhow::Result<()> {
    let config = Config::new(project_name, schema_path, project_name);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    config
        .save(path)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Load the configuration file (if any) and apply the command-line overrides
async fn build_config(args: &GenerateArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .await
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            let schema_path = args
                .schema_path
                .clone()
                .context("--schema-path is required without --config")?;
            let project_name = args
                .project_name
                .clone()
                .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());
            Config::new(project_name.clone(), schema_path, project_name)
        }
    };

    if let Some(schema_path) = &args.schema_path {
        config.openapi_schema_path = schema_path.clone();
    }
    if let Some(project_name) = &args.project_name {
        config.project_name = project_name.clone();
    }
    match &args.output_dir {
        Some(output_dir) => config.output_dir = output_dir.to_string_lossy().to_string(),
        None if args.config.is_none() => config.output_dir = config.project_name.clone(),
        None => {}
    }
    if let Some(template_dir) = &args.template_dir {
        config.template_dir = Some(template_dir.to_string_lossy().to_string());
    }
    if let Some(package) = &args.invoker_package {
        config.invoker_package = package.clone();
    }
    if let Some(package) = &args.api_package {
        config.api_package = package.clone();
    }
    if let Some(package) = &args.model_package {
        config.model_package = package.clone();
    }
    if args.generate_auth_parameters {
        config.generate_auth_parameters = true;
    }
    if let Some(base_url) = &args.base_url {
        config.base_url = Some(base_url.clone());
    }
    if !args.include_operations.is_empty() {
        config.include_operations = args.include_operations.clone();
    }
    config
        .exclude_operations
        .extend(args.exclude_operations.iter().cloned());
    config.format_mappings.extend(args.format_mappings.iter().cloned());
    config.type_mappings.extend(args.type_mappings.iter().cloned());
    config.additional_properties.extend(
        args.additional_properties
            .iter()
            .map(|(key, value)| (key.clone(), JsonValue::String(value.clone()))),
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    fn generate_args(args: &[&str]) -> GenerateArgs {
        let cli = Cli::try_parse_from(std::iter::once("micronaut-gen").chain(args.iter().copied()))
            .expect("valid arguments");
        match cli.command {
            Commands::Generate(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_flags_without_config_file() -> anyhow::Result<()> {
        let args = generate_args(&[
            "generate",
            "--schema-path",
            "petstore.yaml",
            "--project-name",
            "petstore",
            "--generate-auth-parameters",
            "--include-operations",
            "listPets,getPet",
            "--format-mapping",
            "money=org.javamoney.moneta.Money",
            "--additional-property",
            "generateAuthParameters=true",
        ]);
        let config = build_config(&args).await?;

        assert_eq!(config.openapi_schema_path, "petstore.yaml");
        assert_eq!(config.output_dir, "petstore");
        assert!(config.generate_auth_parameters);
        assert_eq!(config.include_operations, vec!["listPets", "getPet"]);
        assert_eq!(
            config.format_mappings.get("money").map(String::as_str),
            Some("org.javamoney.moneta.Money")
        );
        assert_eq!(
            config.additional_properties.get("generateAuthParameters"),
            Some(&JsonValue::String("true".to_string()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_schema_path_required_without_config() {
        let args = generate_args(&["generate"]);
        assert!(build_config(&args).await.is_err());
    }

    #[tokio::test]
    async fn test_flags_override_config_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join(DEFAULT_CONFIG_FILE);
        write_starter_config(&path, "petstore", "petstore.yaml").await?;

        let path_arg = path.to_string_lossy().to_string();
        let args = generate_args(&[
            "generate",
            "--config",
            &path_arg,
            "--api-package",
            "com.example.api",
            "--base-url",
            "https://petstore.example.com",
        ]);
        let config = build_config(&args).await?;

        assert_eq!(config.project_name, "petstore");
        assert_eq!(config.output_dir, "petstore");
        assert_eq!(config.api_package, "com.example.api");
        assert_eq!(config.invoker_package, "org.openapitools");
        assert_eq!(
            config.base_url.as_ref().map(Url::as_str),
            Some("https://petstore.example.com/")
        );
        Ok(())
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("uuid=java.util.UUID"),
            Ok(("uuid".to_string(), "java.util.UUID".to_string()))
        );
        assert!(parse_key_value("uuid").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_init_defaults() {
        let cli = Cli::try_parse_from(["micronaut-gen", "init", "--force"]).expect("valid arguments");
        match cli.command {
            Commands::Init { path, force, .. } => {
                assert_eq!(path, PathBuf::from(DEFAULT_CONFIG_FILE));
                assert!(force);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

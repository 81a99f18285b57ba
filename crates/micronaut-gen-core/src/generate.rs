//! Code generation entry points

use std::path::{Path, PathBuf};

use crate::{
    config::Config,
    error::Result,
    generator::{MicronautClientGenerator, GENERATOR_NAME},
    openapi::OpenApiContext,
    templates::{GenerationReport, TemplateManager},
};

/// Main entry point for code generation
pub async fn generate(config: &Config) -> Result<GenerationReport> {
    // 1. Load OpenAPI document
    let spec = OpenApiContext::from_file_or_url(&config.openapi_schema_path).await?;

    // 2. Generate from the loaded document
    generate_from_spec(&spec, config).await
}

/// Generate a client project from an already loaded document
pub async fn generate_from_spec(spec: &OpenApiContext, config: &Config) -> Result<GenerationReport> {
    // 1. Initialize template manager with template_dir from config if available
    let template_dir = config.template_dir.as_ref().map(PathBuf::from);
    let template_manager = TemplateManager::new(GENERATOR_NAME, template_dir).await?;

    // 2. Prepare the generator: options, scaffolding, component schemas
    let mut generator = MicronautClientGenerator::new(config.clone());
    generator.process_opts();
    generator.register_manifest_files(template_manager.manifest());
    generator.load_components(spec);

    // 3. Delegate to TemplateManager.generate
    template_manager
        .generate(spec, &generator, Path::new(&config.output_dir))
        .await
}

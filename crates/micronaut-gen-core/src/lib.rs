//! Micronaut client generator core library
//!
//! This library turns OpenAPI documents into Micronaut HTTP client projects:
//! Java API interfaces, models and the Gradle scaffolding around them.

pub mod builders;
pub mod config;
pub mod error;
pub mod generate;
pub mod generator;
pub mod layout;
pub mod manifest;
pub mod openapi;
pub mod schema;
pub mod supporting;
pub mod templates;
pub mod types;
pub mod utils;

pub use crate::{
    config::Config,
    error::{Error, Result},
    generate::{generate, generate_from_spec},
    generator::{CodegenType, MicronautClientGenerator},
    openapi::OpenApiContext,
    templates::{GenerationReport, TemplateDir, TemplateManager},
    types::{SchemaTypeResolver, TypeResolver},
};

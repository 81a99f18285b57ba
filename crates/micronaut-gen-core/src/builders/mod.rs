//! Template contexts built from the parsed OpenAPI document.
pub mod java;

pub use java::{JavaContextBuilder, ModelContext, OperationContext};

use std::collections::BTreeMap;

use serde::Serialize;

use crate::utils::to_class_name;

/// Tag used for operations that declare none.
pub const DEFAULT_TAG: &str = "default";

/// One generated client interface: the operations sharing a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiContext {
    pub tag: String,
    pub class_name: String,
    pub package: String,
    pub operations: Vec<OperationContext>,
}

impl ApiContext {
    /// `pets` -> `PetsApi`
    pub fn class_name_for(tag: &str) -> String {
        format!("{}Api", to_class_name(tag))
    }

    /// Group operations into APIs by their first tag.
    /// APIs are sorted by class name and operations by nickname for stable output.
    pub fn group(
        operations: Vec<(Option<String>, OperationContext)>,
        package: &str,
    ) -> Vec<ApiContext> {
        let mut apis: BTreeMap<String, ApiContext> = BTreeMap::new();
        for (tag, operation) in operations {
            let tag = tag.unwrap_or_else(|| DEFAULT_TAG.to_string());
            let class_name = Self::class_name_for(&tag);
            apis.entry(class_name.clone())
                .or_insert_with(|| ApiContext {
                    tag,
                    class_name,
                    package: package.to_string(),
                    operations: Vec::new(),
                })
                .operations
                .push(operation);
        }

        apis.into_values()
            .map(|mut api| {
                api.operations.sort_by(|a, b| a.nickname.cmp(&b.nickname));
                api
            })
            .collect()
    }
}

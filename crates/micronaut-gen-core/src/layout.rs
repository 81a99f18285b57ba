//! Output folder layout and supporting-file folder policies.
//!
//! Template sets written for the stock Java generators put supporting sources
//! under `generated-sources/openapi`; a [`FolderPolicy`] decides where such a
//! folder really lands in the generated project.

use serde::{Deserialize, Serialize};

/// Folder the stock Java generators use for generated main sources.
pub const GENERATED_SOURCE_FOLDER: &str = "generated-sources/openapi";

/// Folder the stock Java generators use for generated test sources.
pub const GENERATED_TEST_SOURCE_FOLDER: &str = "generated-test-sources/openapi";

/// A project folder and the folder holding its Java sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFolders {
    pub project: String,
    pub source: String,
}

impl OutputFolders {
    /// Folders with the conventional `{project}/java` source root.
    pub fn new(project: impl Into<String>) -> Self {
        let project = project.into();
        let source = format!("{}/java", project);
        Self { project, source }
    }
}

/// Decides the output folder of a supporting file.
pub trait FolderPolicy: Send + Sync {
    fn resolve(&self, folder: &str) -> String;
}

/// Sends the generated-sources folders to the configured source roots and
/// leaves every other folder untouched.
#[derive(Debug, Clone)]
pub struct GeneratedSourcesRedirect {
    sources: OutputFolders,
    tests: OutputFolders,
}

impl GeneratedSourcesRedirect {
    pub fn new(sources: OutputFolders, tests: OutputFolders) -> Self {
        Self { sources, tests }
    }
}

impl FolderPolicy for GeneratedSourcesRedirect {
    fn resolve(&self, folder: &str) -> String {
        match folder.trim_end_matches('/') {
            GENERATED_SOURCE_FOLDER => self.sources.source.clone(),
            GENERATED_TEST_SOURCE_FOLDER => self.tests.source.clone(),
            _ => folder.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_source_folder() {
        let folders = OutputFolders::new("src/main");
        assert_eq!(folders.project, "src/main");
        assert_eq!(folders.source, "src/main/java");
    }

    #[test]
    fn test_redirect() {
        let policy =
            GeneratedSourcesRedirect::new(OutputFolders::new("src/main"), OutputFolders::new("src/test"));
        assert_eq!(policy.resolve("generated-sources/openapi"), "src/main/java");
        assert_eq!(policy.resolve("generated-sources/openapi/"), "src/main/java");
        assert_eq!(policy.resolve("generated-test-sources/openapi"), "src/test/java");
        assert_eq!(policy.resolve("gradle/wrapper"), "gradle/wrapper");
        assert_eq!(policy.resolve(""), "");
    }
}

//! Supporting files: project scaffolding emitted once per generation.
//!
//! A supporting file is either rendered through Tera or copied verbatim
//! from the template directory (scripts and binaries such as the Gradle
//! wrapper jar).

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value as JsonValue;

/// How a supporting file is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportingFileKind {
    Render,
    Copy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportingFile {
    /// Path of the template, relative to the template directory
    pub template: String,
    /// Output folder, relative to the output directory ("" for the root)
    pub folder: String,
    /// Output file name
    pub destination: String,
    pub kind: SupportingFileKind,
    /// Whether an existing file is replaced
    pub overwrite: bool,
    /// Whether a missing template is skipped instead of failing generation
    pub optional: bool,
    /// Extra template variables, taking precedence over the shared context
    pub context: JsonValue,
}

impl SupportingFile {
    pub fn render(
        template: impl Into<String>,
        folder: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            template: template.into(),
            folder: folder.into(),
            destination: destination.into(),
            kind: SupportingFileKind::Render,
            overwrite: true,
            optional: false,
            context: JsonValue::Null,
        }
    }

    pub fn copy(
        template: impl Into<String>,
        folder: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            kind: SupportingFileKind::Copy,
            ..Self::render(template, folder, destination)
        }
    }

    /// Keep a file that already exists in the output directory.
    pub fn do_not_overwrite(mut self) -> Self {
        self.overwrite = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_context(mut self, context: JsonValue) -> Self {
        self.context = context;
        self
    }

    /// Output path relative to the output directory.
    pub fn relative_path(&self) -> PathBuf {
        if self.folder.is_empty() {
            PathBuf::from(&self.destination)
        } else {
            Path::new(&self.folder).join(&self.destination)
        }
    }

    fn same_target(&self, other: &SupportingFile) -> bool {
        self.template == other.template
            && self.folder == other.folder
            && self.destination == other.destination
    }
}

/// Ordered set of supporting files.
#[derive(Debug, Clone, Default)]
pub struct SupportingFiles {
    files: Vec<SupportingFile>,
}

impl SupportingFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file unless the same template already targets the same path.
    /// Returns whether the file was added.
    pub fn add(&mut self, file: SupportingFile) -> bool {
        if self.files.iter().any(|existing| existing.same_target(&file)) {
            log::debug!("Supporting file {} already registered", file.template);
            return false;
        }
        self.files.push(file);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &SupportingFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn find(&self, destination: &str) -> Option<&SupportingFile> {
        self.files.iter().find(|f| f.destination == destination)
    }
}

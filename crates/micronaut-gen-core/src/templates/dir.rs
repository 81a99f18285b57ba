//! Unified handling of template directory resolution

use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming the directory that holds template sets.
pub const TEMPLATE_DIR_ENV: &str = "MICRONAUT_GEN_TEMPLATE_DIR";

/// Represents a template directory with resolved paths and validation
#[derive(Debug, Clone)]
pub struct TemplateDir {
    /// Root directory containing the template sets
    root_dir: PathBuf,
    /// Path to the specific template set (root_dir/name)
    template_path: PathBuf,
    /// Name of the template set
    name: String,
}

impl TemplateDir {
    /// Create a new TemplateDir with explicit paths
    pub fn new(root_dir: PathBuf, template_path: PathBuf, name: impl Into<String>) -> Self {
        Self {
            root_dir,
            template_path,
            name: name.into(),
        }
    }

    /// Returns a displayable version of the template path
    pub fn display(&self) -> std::path::Display<'_> {
        self.template_path.display()
    }

    /// Discover the directory of the named template set.
    ///
    /// An explicit directory may point at the template set itself or at the
    /// directory containing it. Without one, the standard locations are
    /// searched in order: `$MICRONAUT_GEN_TEMPLATE_DIR`, `../templates`,
    /// `./templates`, the workspace `templates/` and
    /// `~/.micronaut-gen/templates`.
    pub fn discover(name: &str, custom_dir: Option<&Path>) -> io::Result<Self> {
        let (root_dir, template_path) = if let Some(dir) = custom_dir {
            if !dir.exists() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Template directory not found: {}", dir.display()),
                ));
            }
            let nested = dir.join(name);
            if nested.is_dir() {
                (dir.to_path_buf(), nested)
            } else {
                let root = dir.parent().unwrap_or(dir).to_path_buf();
                (root, dir.to_path_buf())
            }
        } else {
            let root_dir = Self::find_template_base_dir().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "Could not find template directory in any standard location",
                )
            })?;
            let template_path = root_dir.join(name);
            (root_dir, template_path)
        };

        if !template_path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Template directory not found: {}", template_path.display()),
            ));
        }

        log::debug!("Using templates from {}", template_path.display());
        Ok(Self::new(root_dir, template_path, name))
    }

    /// Find the directory holding template sets by checking standard locations
    fn find_template_base_dir() -> Option<PathBuf> {
        // 1. Check environment variable
        if let Ok(dir) = std::env::var(TEMPLATE_DIR_ENV) {
            let path = PathBuf::from(dir);
            if path.exists() {
                return Some(path);
            }
            log::warn!("{} points to a missing directory: {}", TEMPLATE_DIR_ENV, path.display());
        }

        // 2. Development checkouts: ../templates, then ./templates
        for base in ["..", "."] {
            let templates_dir = PathBuf::from(base).join("templates");
            if templates_dir.is_dir() {
                return Some(templates_dir);
            }
        }

        // 3. The workspace this crate was built in
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        if let Some(templates_dir) = manifest_dir
            .ancestors()
            .map(|dir| dir.join("templates"))
            .find(|dir| dir.is_dir())
        {
            return Some(templates_dir);
        }

        // 4. The user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            let templates_dir = home_dir.join(".micronaut-gen").join("templates");
            if templates_dir.is_dir() {
                return Some(templates_dir);
            }
        }

        None
    }

    /// Get the root directory containing the template sets
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the name of the template set
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the path to the specific template set
    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// Check if the template directory exists
    pub fn exists(&self) -> bool {
        self.template_path.exists()
    }
}

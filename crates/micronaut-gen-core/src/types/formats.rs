//! Custom `format` overrides.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;

/// Formats that always resolve to a dedicated Java type, whatever the
/// declared `type` of the schema says.
static DEFAULT_FORMATS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("uuid", "java.util.UUID"),
        ("uri", "java.net.URI"),
        ("url", "java.net.URL"),
    ])
});

/// Read-only mapping from a schema `format` to a resolved type name.
#[derive(Debug, Clone, Default)]
pub struct FormatTable {
    entries: HashMap<String, String>,
}

impl FormatTable {
    /// Built-in defaults extended (and overridden) by configured mappings.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut entries: HashMap<String, String> = DEFAULT_FORMATS
            .iter()
            .map(|(format, ty)| (format.to_string(), ty.to_string()))
            .collect();
        for (format, ty) in overrides {
            entries.insert(format.clone(), ty.clone());
        }
        Self { entries }
    }

    pub fn get(&self, format: &str) -> Option<&str> {
        self.entries.get(format).map(String::as_str)
    }

    pub fn contains(&self, format: &str) -> bool {
        self.entries.contains_key(format)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormatTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(format, ty)| (format.into(), ty.into()))
                .collect(),
        }
    }
}

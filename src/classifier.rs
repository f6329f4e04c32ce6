use std::collections::HashMap;

use crate::{CATEGORY_TABLE, FALLBACK_CATEGORY};

/// Extension -> category lookup built once at startup from `CATEGORY_TABLE`.
///
/// Lookups are total: unknown or missing extensions resolve to the
/// fallback category instead of failing.
#[derive(Debug, Clone)]
pub struct CategoryMap {
    by_extension: HashMap<String, &'static str>,
    labels: Vec<&'static str>,
}

impl CategoryMap {
    pub fn new() -> Self {
        let mut by_extension = HashMap::new();
        let mut labels = Vec::with_capacity(CATEGORY_TABLE.len() + 1);

        for (category, extensions) in CATEGORY_TABLE {
            labels.push(*category);
            for ext in *extensions {
                by_extension.insert((*ext).to_string(), *category);
            }
        }
        labels.push(FALLBACK_CATEGORY);

        Self { by_extension, labels }
    }

    /// Map an extension to its category label.
    ///
    /// Case-insensitive, tolerates a leading dot, never fails.
    pub fn classify(&self, extension: &str) -> &'static str {
        let ext = extension.trim_start_matches('.').to_lowercase();
        self.by_extension
            .get(ext.as_str())
            .copied()
            .unwrap_or(FALLBACK_CATEGORY)
    }

    /// True if `name` is one of the category folder names (fallback included).
    ///
    /// The engine's skip predicate: a file directly under such a folder is
    /// considered already organized.
    pub fn is_category_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| *label == name)
    }

    /// All category labels in table order, fallback last.
    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::new()
    }
}

//! Subtree matching for stored absolute paths
//!
//! A path lies inside a subtree rooted at `R` when it equals `R` or starts
//! with `R` followed by the path separator, so `/src/app` never captures
//! `/src/application`.

use std::path::MAIN_SEPARATOR;

/// A directory subtree expressed as an exact path and a separator-terminated prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtree {
    exact: String,
    prefix: String,
}

impl Subtree {
    pub fn new(root: &str) -> Self {
        let trimmed = root.trim_end_matches(MAIN_SEPARATOR);
        if trimmed.is_empty() {
            // Filesystem root (or empty input): everything is inside
            let root = if root.is_empty() {
                String::new()
            } else {
                MAIN_SEPARATOR.to_string()
            };
            return Self {
                exact: root.clone(),
                prefix: root,
            };
        }

        Self {
            exact: trimmed.to_string(),
            prefix: format!("{}{}", trimmed, MAIN_SEPARATOR),
        }
    }

    /// The subtree root without a trailing separator
    pub fn exact(&self) -> &str {
        &self.exact
    }

    /// The subtree root with exactly one trailing separator
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn contains(&self, path: &str) -> bool {
        path == self.exact || path.starts_with(&self.prefix)
    }

    /// SQL predicate over `column`; bind [`Subtree::exact`] then [`Subtree::prefix`] twice
    pub fn sql_predicate(column: &str) -> String {
        format!(
            "({col} = ? OR substr({col}, 1, length(?)) = ?)",
            col = column
        )
    }
}

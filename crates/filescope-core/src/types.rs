//! Core type definitions for indexed files and query results

use serde::{Deserialize, Serialize};

/// One row of the `files` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedFile {
    pub id: i64,
    pub path: String,
    pub name: String,
    pub size: u64,
    /// Lowercase extension including the leading dot, or empty
    pub extension: String,
    pub fingerprint: Option<String>,
    /// Seconds since the Unix epoch
    pub modified_time: Option<f64>,
    pub indexed_at: String,
}

/// A single matching line returned by a search
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: String,
    pub line_number: i64,
    pub line: String,
}

/// Aggregate of indexed files sharing an extension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTypeStat {
    pub extension: String,
    pub count: i64,
    pub total_size: u64,
}

impl FileTypeStat {
    /// Extension for display, with a placeholder for extensionless files
    pub fn display_extension(&self) -> &str {
        if self.extension.is_empty() {
            "(none)"
        } else {
            &self.extension
        }
    }
}

/// Summary of the index contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub file_count: i64,
    pub line_count: i64,
    /// Sum of the sizes of all indexed files
    pub total_size: u64,
    pub file_types: Vec<FileTypeStat>,
    /// On-disk footprint of the store (database plus write-ahead log)
    pub index_size: u64,
    pub last_indexed: Option<String>,
    pub full_text_enabled: bool,
    pub version: i32,
}

impl IndexInfo {
    /// Index footprint relative to the indexed content, `None` when nothing is indexed
    pub fn ratio(&self) -> Option<f64> {
        if self.total_size == 0 {
            None
        } else {
            Some(self.index_size as f64 / self.total_size as f64)
        }
    }

    /// Ratio formatted as a percentage, "N/A" for an empty index
    pub fn ratio_display(&self) -> String {
        match self.ratio() {
            Some(r) => format!("{:.1}%", r * 100.0),
            None => "N/A".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(total_size: u64, index_size: u64) -> IndexInfo {
        IndexInfo {
            file_count: 0,
            line_count: 0,
            total_size,
            file_types: Vec::new(),
            index_size,
            last_indexed: None,
            full_text_enabled: true,
            version: 2,
        }
    }

    #[test]
    fn test_ratio_empty_index() {
        let info = info(0, 4096);
        assert_eq!(info.ratio(), None);
        assert_eq!(info.ratio_display(), "N/A");
    }

    #[test]
    fn test_ratio_display() {
        let info = info(1000, 1500);
        assert_eq!(info.ratio_display(), "150.0%");
    }

    #[test]
    fn test_display_extension() {
        let stat = FileTypeStat {
            extension: String::new(),
            count: 1,
            total_size: 10,
        };
        assert_eq!(stat.display_extension(), "(none)");
    }
}

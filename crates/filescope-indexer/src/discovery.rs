//! Directory traversal for indexing runs

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::eligibility::Classifier;

/// An entry produced by [`walk_tree`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEntry {
    /// A directory below the root that will be descended into
    Directory(PathBuf),
    /// A regular file, or a symlink to one
    File(PathBuf),
}

/// Walk `root` in file-name order, pruning directories the classifier skips
///
/// Directory symlinks are not followed. Entries that cannot be read are
/// logged and skipped.
pub fn walk_tree<'a>(root: &Path, classifier: &'a Classifier) -> impl Iterator<Item = WalkEntry> + 'a {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !classifier.should_skip_dir(&entry.file_name().to_string_lossy())
        })
        .filter_map(|result| match result {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter_map(|entry| {
            let file_type = entry.file_type();
            if file_type.is_dir() {
                (entry.depth() > 0).then(|| WalkEntry::Directory(entry.into_path()))
            } else if file_type.is_file() || (entry.path_is_symlink() && entry.path().is_file()) {
                Some(WalkEntry::File(entry.into_path()))
            } else {
                None
            }
        })
}

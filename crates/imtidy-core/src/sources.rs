//! Source document discovery

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, TidyError};

/// Recursively list the files under `root` whose name ends with
/// `.<extension>`, sorted by path.
///
/// `extension` may be given with or without the leading dot. Directories
/// that cannot be read are skipped with a warning.
pub fn find_source_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(TidyError::SourceDirectory(root.to_path_buf()));
    }

    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable path under {:?}: {}", root, e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        // Lossy names keep their ASCII suffix, so non-UTF-8 names still match
        if entry.file_name().to_str().is_none() {
            tracing::debug!("Source name is not valid UTF-8: {:?}", entry.path());
        }
        let matches = entry.file_name().to_string_lossy().ends_with(&suffix);
        if matches {
            files.push(entry.into_path());
        }
    }

    files.sort();
    tracing::debug!("Found {} source files under {:?}", files.len(), root);
    Ok(files)
}

//! Test fixture loading utilities

use std::path::{Path, PathBuf};

use imtidy_bibtex::BibTeXEntry;

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// Load a fixture file as a string
#[allow(dead_code)]
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// Directory holding the fixture LaTeX sources
#[allow(dead_code)]
pub fn tex_dir() -> PathBuf {
    fixture_path("tex")
}

/// Copy a fixture bibliography into `dir` and return the copy's path
#[allow(dead_code)]
pub fn copy_bib_fixture(name: &str, dir: &Path) -> PathBuf {
    let target = dir.join(name);
    std::fs::copy(fixture_path(name), &target)
        .unwrap_or_else(|_| panic!("Failed to copy fixture: {}", name));
    target
}

/// Cite keys of a list of entries, in order
#[allow(dead_code)]
pub fn cite_keys(entries: &[BibTeXEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.cite_key.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_path() {
        let path = fixture_path("refs.bib");
        assert!(path.to_string_lossy().contains("test_fixtures"));
    }

    #[test]
    fn test_load_bib_fixture() {
        let content = load_fixture("refs.bib");
        assert!(content.contains("@article"));
    }
}

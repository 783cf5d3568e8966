//! Source discovery and reading.

pub mod walker;

pub use walker::{FileWalker, SOURCE_EXTENSIONS};

use crate::config::IgnoreConfig;
use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Source files under each root, deduplicated and sorted.
pub fn discover_sources(roots: &[PathBuf], ignore: &IgnoreConfig) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = roots
        .iter()
        .flat_map(|root| {
            FileWalker::new(root.clone())
                .with_ignore(ignore.clone())
                .walk()
        })
        .collect();
    files.sort();
    files.dedup();
    files
}

/// Read every file. Unreadable or non-UTF-8 files are logged and left out.
pub fn read_sources(paths: &[PathBuf]) -> BTreeMap<PathBuf, String> {
    paths
        .iter()
        .filter_map(|path| match read_file(path) {
            Ok(content) => Some((path.clone(), content)),
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unreadable_files_are_left_out() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.rb");
        let binary = dir.path().join("binary.rb");
        fs::write(&good, "x = 1\n").unwrap();
        fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        let missing = dir.path().join("missing.rb");

        let sources = read_sources(&[good.clone(), binary, missing]);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources.get(&good).map(String::as_str), Some("x = 1\n"));
    }

    #[test]
    fn overlapping_roots_are_deduplicated() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.rb"), "").unwrap();
        let roots = vec![dir.path().to_path_buf(), dir.path().join("a.rb")];
        assert_eq!(discover_sources(&roots, &IgnoreConfig::default()).len(), 1);
    }
}

use crate::config::IgnoreConfig;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions treated as analysable source.
pub const SOURCE_EXTENSIONS: &[&str] = &["rb", "rake"];

const VENDORED_DIRS: &[&str] = &[".git", "vendor", "node_modules", "tmp"];

pub struct FileWalker {
    root: PathBuf,
    extensions: Vec<String>,
    ignore: IgnoreConfig,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            extensions: SOURCE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ignore: IgnoreConfig::default(),
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_ignore(mut self, ignore: IgnoreConfig) -> Self {
        self.ignore = ignore;
        self
    }

    /// Source files under the root, sorted. A root that is itself a file is
    /// returned as is. Unreadable entries are logged and skipped.
    pub fn walk(&self) -> Vec<PathBuf> {
        if self.root.is_file() {
            return vec![self.root.clone()];
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !VENDORED_DIRS.iter().any(|dir| entry.file_name() == *dir)
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    log::warn!("Skipping directory entry: {err}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.should_process(path))
            .collect();

        files.sort();
        files
    }

    fn should_process(&self, path: &Path) -> bool {
        let has_extension = path
            .extension()
            .map(|ext| ext.to_string_lossy())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext));
        if !has_extension {
            return false;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        !self.ignore.is_ignored(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn finds_ruby_sources_and_honours_ignores() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("lib/billing")).unwrap();
        fs::create_dir_all(root.join("vendor/gems")).unwrap();
        fs::create_dir_all(root.join("db")).unwrap();
        fs::write(root.join("lib/billing/invoice.rb"), "").unwrap();
        fs::write(root.join("lib/tasks.rake"), "").unwrap();
        fs::write(root.join("lib/README.md"), "").unwrap();
        fs::write(root.join("vendor/gems/x.rb"), "").unwrap();
        fs::write(root.join("db/schema.rb"), "").unwrap();

        let ignore = IgnoreConfig {
            patterns: vec!["db/**".into()],
        };
        let files = FileWalker::new(root.to_path_buf()).with_ignore(ignore).walk();
        let relative: Vec<PathBuf> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("lib/billing/invoice.rb"),
                PathBuf::from("lib/tasks.rake"),
            ]
        );
    }

    #[test]
    fn single_file_root_is_returned() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.rb");
        fs::write(&file, "").unwrap();
        assert_eq!(FileWalker::new(file.clone()).walk(), vec![file]);
    }
}

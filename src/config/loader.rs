use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::{EnforcerConfig, Thresholds};
use crate::errors::{Error, Result, ResultExt};

pub const CONFIG_FILE_NAME: &str = ".enforcer.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Read config file contents
pub(crate) fn read_config_file(path: &Path) -> std::io::Result<String> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse and validate config from a TOML string.
///
/// Invalid thresholds are replaced by defaults rather than failing the load.
pub fn parse_and_validate_config(contents: &str) -> Result<EnforcerConfig> {
    let mut config = toml::from_str::<EnforcerConfig>(contents)
        .map_err(Error::from)
        .context(format!("Failed to parse {CONFIG_FILE_NAME}"))?;

    if let Err(e) = config.thresholds.validate() {
        log::warn!("Invalid thresholds: {e}. Using defaults.");
        config.thresholds = Thresholds::default();
    }

    if config.conceptual.sample_size == 0 {
        log::warn!("conceptual.sample_size must be positive. Using default.");
        config.conceptual.sample_size = super::ConceptualConfig::default().sample_size;
    }

    Ok(config)
}

/// Try loading config from a specific path; `None` when absent or invalid.
pub fn try_load_config_from_path(config_path: &Path) -> Option<EnforcerConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{e}. Using defaults.");
            None
        }
    }
}

/// Load config from an explicit path, falling back to defaults.
pub fn load_config_from_path(config_path: &Path) -> EnforcerConfig {
    try_load_config_from_path(config_path).unwrap_or_default()
}

/// Only log actual errors, not "file not found"
fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Directory ancestors of `start`, nearest first, up to `max_depth` entries.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Locate the nearest config file above `start`.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Search `start` and its ancestors for a config file.
pub fn load_config_from(start: &Path) -> EnforcerConfig {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            EnforcerConfig::default()
        })
}

pub fn load_config() -> EnforcerConfig {
    match std::env::current_dir() {
        Ok(dir) => load_config_from(&dir),
        Err(e) => {
            log::warn!("Failed to get current directory: {e}. Using default config.");
            EnforcerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ancestors_stop_at_depth() {
        let dirs: Vec<_> = directory_ancestors(PathBuf::from("/a/b/c/d"), 3).collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/a/b/c/d"),
                PathBuf::from("/a/b/c"),
                PathBuf::from("/a/b")
            ]
        );
    }

    #[test]
    fn invalid_thresholds_fall_back_to_defaults() {
        let config = parse_and_validate_config("[thresholds]\nmax_params = 0\n").unwrap();
        assert_eq!(config.thresholds, Thresholds::default());
    }

    #[test]
    fn config_is_found_in_parent_directory() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("lib").join("models");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            root.path().join(CONFIG_FILE_NAME),
            "[thresholds]\nmax_method_lines = 12\n",
        )
        .unwrap();

        let config = load_config_from(&nested);
        assert_eq!(config.thresholds.max_method_lines, 12);
        assert_eq!(
            find_config_file(&nested),
            Some(root.path().join(CONFIG_FILE_NAME))
        );
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let root = TempDir::new().unwrap();
        let path = root.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "thresholds = [not toml").unwrap();
        assert_eq!(load_config_from_path(&path).thresholds, Thresholds::default());
    }
}

mod loader;
mod thresholds;

pub use loader::{
    directory_ancestors, find_config_file, load_config, load_config_from, load_config_from_path,
    parse_and_validate_config, try_load_config_from_path, CONFIG_FILE_NAME,
};
pub use thresholds::Thresholds;

use crate::core::cache::MtimeCache;
use crate::patterns::RuleSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnforcerConfig {
    #[serde(default)]
    pub thresholds: Thresholds,

    /// Literal rules added on top of the built-in catalog
    #[serde(default)]
    pub rules: Vec<RuleSpec>,

    #[serde(default)]
    pub smells: SmellConfig,

    #[serde(default)]
    pub conceptual: ConceptualConfig,

    #[serde(default)]
    pub ignore: IgnoreConfig,

    #[serde(default)]
    pub learning: LearningConfig,
}

/// Fix suggestions per smell name (`god_class`, `long_method`, ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmellConfig {
    #[serde(default)]
    pub fixes: BTreeMap<String, String>,
}

/// Model-assisted conceptual pass sampling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptualConfig {
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    #[serde(default)]
    pub seed: u64,
}

impl Default for ConceptualConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            seed: 0,
        }
    }
}

fn default_sample_size() -> usize {
    3
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IgnoreConfig {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl IgnoreConfig {
    /// Whether `path` matches any ignore glob. Invalid globs are skipped.
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.patterns.iter().any(|pattern| {
            match glob::Pattern::new(pattern) {
                Ok(compiled) => compiled.matches_path(path),
                Err(e) => {
                    log::warn!("Skipping invalid ignore pattern '{pattern}': {e}");
                    false
                }
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".enforcer").join("learnings.jsonl")
}

/// Process-wide config cache, re-validated against the config file's mtime.
pub type ConfigCache = MtimeCache<EnforcerConfig>;

/// Cache the config found above `start`, or the default location when none exists yet.
pub fn config_cache_for(start: &Path) -> ConfigCache {
    let path = find_config_file(start).unwrap_or_else(|| start.join(CONFIG_FILE_NAME));
    MtimeCache::new(path)
}

/// Read through the cache, reloading the config when its file changed.
pub fn cached_config(cache: &mut ConfigCache) -> &EnforcerConfig {
    cache.get_or_load(load_config_from_path)
}

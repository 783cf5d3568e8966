use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Cached value paired with the modification time of the file it was built from.
#[derive(Debug)]
struct CacheEntry<T> {
    value: T,
    source_mtime: Option<DateTime<Utc>>,
}

/// Single-value cache keyed by a source file's modification time.
///
/// Every read re-stats the source; the value is rebuilt when the mtime has
/// changed (or the file appeared or vanished). Construct one per process and
/// pass it by reference to whatever needs the cached value.
#[derive(Debug)]
pub struct MtimeCache<T> {
    path: PathBuf,
    entry: Option<CacheEntry<T>>,
    hits: usize,
    misses: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

impl<T> MtimeCache<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entry: None,
            hits: 0,
            misses: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached value, rebuilding it with `load` when the source changed.
    pub fn get_or_load<F>(&mut self, load: F) -> &T
    where
        F: FnOnce(&Path) -> T,
    {
        let current = source_mtime(&self.path);

        match self.entry.take() {
            Some(entry) if entry.source_mtime == current => {
                self.hits += 1;
                &self.entry.insert(entry).value
            }
            _ => {
                self.misses += 1;
                log::debug!("Reloading {} (mtime {:?})", self.path.display(), current);
                let value = load(&self.path);
                &self
                    .entry
                    .insert(CacheEntry {
                        value,
                        source_mtime: current,
                    })
                    .value
            }
        }
    }

    /// Drop the cached value so the next read reloads unconditionally.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
        }
    }
}

fn source_mtime(path: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map(DateTime::from)
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(path: &Path, offset_secs: u64) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
            .unwrap();
    }

    #[test]
    fn reuses_value_while_mtime_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".enforcer.toml");
        std::fs::write(&path, "a").unwrap();

        let mut cache = MtimeCache::new(&path);
        let mut loads = 0;
        for _ in 0..3 {
            cache.get_or_load(|p| {
                loads += 1;
                std::fs::read_to_string(p).unwrap()
            });
        }

        assert_eq!(loads, 1);
        assert_eq!(cache.stats(), CacheStats { hits: 2, misses: 1 });
    }

    #[test]
    fn reloads_after_source_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(&path, "first").unwrap();

        let mut cache = MtimeCache::new(&path);
        let first = cache
            .get_or_load(|p| std::fs::read_to_string(p).unwrap())
            .clone();

        std::fs::write(&path, "second").unwrap();
        touch(&path, 60);
        let second = cache
            .get_or_load(|p| std::fs::read_to_string(p).unwrap())
            .clone();

        assert_eq!(first, "first");
        assert_eq!(second, "second");
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn missing_source_is_cached_until_it_appears() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");

        let mut cache = MtimeCache::new(&path);
        assert_eq!(*cache.get_or_load(|p| p.exists()), false);
        assert_eq!(*cache.get_or_load(|p| p.exists()), false);
        assert_eq!(cache.stats().hits, 1);

        std::fs::write(&path, "x").unwrap();
        assert_eq!(*cache.get_or_load(|p| p.exists()), true);
    }
}

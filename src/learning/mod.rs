//! Append-only log of fix outcomes, and the confidence derived from it.
//!
//! Each line of the store is one JSON [`LearningRecord`]. Records are never
//! edited or removed; confidence is recomputed from the whole log.

mod tiers;

pub use tiers::{ConfidenceTier, MIN_APPLICATIONS};

use crate::core::Finding;
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Records needed for a category before a known fix is trusted.
pub const MIN_RECORDS: usize = 3;
/// Success rate a category must exceed before a known fix is trusted.
pub const MIN_SUCCESS_RATE: f64 = 0.7;

static PATH_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[\w.-]+/)+[\w.-]+|\b[\w-]+\.(?:rb|erb|rake|py|js|ts|rs|ya?ml|json|toml)\b")
        .unwrap()
});
static QUOTED_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"'[^'\s]+'|"[^"\s]+""#).unwrap());
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").unwrap());

/// Strip the specifics from a finding message so equivalent findings share a pattern.
pub fn generalize_message(message: &str) -> String {
    let paths = PATH_LIKE.replace_all(message, "<PATH>");
    let quoted = QUOTED_TOKEN.replace_all(&paths, "<STR>");
    NUMBER.replace_all(&quoted, "<N>").into_owned()
}

/// SHA-256 hex digest of a fix description.
pub fn fingerprint(fix: &str) -> String {
    format!("{:x}", Sha256::digest(fix.as_bytes()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningRecord {
    pub category: String,
    pub pattern: String,
    pub fix_fingerprint: String,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub successes: usize,
    pub failures: usize,
}

impl CategoryStats {
    pub fn total(&self) -> usize {
        self.successes + self.failures
    }

    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.successes as f64 / self.total() as f64
        }
    }

    pub fn tier(&self) -> ConfidenceTier {
        ConfidenceTier::classify(self.successes, self.failures)
    }
}

/// The learning log. With no backing file it only keeps records in memory.
#[derive(Debug, Default)]
pub struct LearningStore {
    path: Option<PathBuf>,
    records: Vec<LearningRecord>,
}

impl LearningStore {
    /// Load every record from `path`. A missing file is an empty store;
    /// malformed lines are logged and skipped.
    pub fn open(path: &Path) -> Result<Self> {
        let mut records = Vec::new();
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            for (idx, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<LearningRecord>(line) {
                    Ok(record) => records.push(record),
                    Err(e) => log::warn!(
                        "Skipping malformed learning record {}:{}: {}",
                        path.display(),
                        idx + 1,
                        e
                    ),
                }
            }
        }
        log::debug!("Loaded {} learning record(s) from {}", records.len(), path.display());
        Ok(Self {
            path: Some(path.to_path_buf()),
            records,
        })
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn records(&self) -> &[LearningRecord] {
        &self.records
    }

    /// Append one outcome. The record is kept in memory even when the
    /// write to disk fails; the error is returned for the caller to log.
    pub fn record(&mut self, finding: &Finding, fix: &str, success: bool) -> Result<()> {
        self.record_fingerprint(finding, fingerprint(fix), success)
    }

    /// Append one outcome for a fix already identified by its fingerprint.
    pub fn record_fingerprint(
        &mut self,
        finding: &Finding,
        fix_fingerprint: String,
        success: bool,
    ) -> Result<()> {
        let record = LearningRecord {
            category: finding.learning_category(),
            pattern: generalize_message(&finding.message),
            fix_fingerprint,
            success,
            timestamp: Utc::now(),
        };
        let appended = match &self.path {
            Some(path) => append_record(path, &record),
            None => Ok(()),
        };
        self.records.push(record);
        appended
    }

    pub fn category_stats(&self) -> BTreeMap<String, CategoryStats> {
        let mut stats: BTreeMap<String, CategoryStats> = BTreeMap::new();
        for record in &self.records {
            let entry = stats.entry(record.category.clone()).or_default();
            if record.success {
                entry.successes += 1;
            } else {
                entry.failures += 1;
            }
        }
        stats
    }

    fn stats_for(&self, category: &str) -> CategoryStats {
        self.records
            .iter()
            .filter(|r| r.category == category)
            .fold(CategoryStats::default(), |mut acc, r| {
                if r.success {
                    acc.successes += 1;
                } else {
                    acc.failures += 1;
                }
                acc
            })
    }

    /// Whether the finding's category has enough successful history to
    /// reuse a recorded fix.
    pub fn known_fix(&self, finding: &Finding) -> bool {
        let stats = self.stats_for(&finding.learning_category());
        stats.total() >= MIN_RECORDS && stats.success_rate() > MIN_SUCCESS_RATE
    }

    /// Fingerprint of the most recent successful fix for the finding's category.
    pub fn apply_known(&self, finding: &Finding) -> Option<String> {
        if !self.known_fix(finding) {
            return None;
        }
        let category = finding.learning_category();
        self.records
            .iter()
            .rev()
            .find(|r| r.success && r.category == category)
            .map(|r| r.fix_fingerprint.clone())
    }

    pub fn tier_for(&self, finding: &Finding) -> ConfidenceTier {
        self.stats_for(&finding.learning_category()).tier()
    }
}

fn append_record(path: &Path, record: &LearningRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let line = serde_json::to_string(record)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    writeln!(file, "{line}").map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, Severity};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn finding() -> Finding {
        Finding::new(
            Category::Lexical,
            "SRP",
            Severity::Warning,
            Path::new("lib/orders/import.rb"),
            "Method 'import_rows' is too long: 60 lines (maximum 50)",
        )
    }

    #[test]
    fn messages_are_generalized() {
        assert_eq!(
            generalize_message("Method 'import_rows' is too long: 60 lines (maximum 50)"),
            "Method <STR> is too long: <N> lines (maximum <N>)"
        );
        assert_eq!(
            generalize_message("See lib/a/b2.rb and config.yml, 3.5 times"),
            "See <PATH> and <PATH>, <N> times"
        );
    }

    #[test]
    fn fingerprint_is_sha256_hex() {
        let fp = fingerprint("extract method");
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, fingerprint("extract method"));
        assert_ne!(fp, fingerprint("inline method"));
    }

    #[test]
    fn known_fix_needs_three_records_and_seventy_percent() {
        let f = finding();

        let mut two = LearningStore::in_memory();
        two.record(&f, "fix", true).unwrap();
        two.record(&f, "fix", true).unwrap();
        assert!(!two.known_fix(&f));

        let mut three = LearningStore::in_memory();
        for _ in 0..3 {
            three.record(&f, "fix", true).unwrap();
        }
        assert!(three.known_fix(&f));
        assert_eq!(three.apply_known(&f), Some(fingerprint("fix")));

        let mut poor = LearningStore::in_memory();
        poor.record(&f, "fix", true).unwrap();
        poor.record(&f, "fix", false).unwrap();
        poor.record(&f, "fix", false).unwrap();
        assert!(!poor.known_fix(&f));
        assert_eq!(poor.apply_known(&f), None);
    }

    #[test]
    fn apply_known_returns_latest_success() {
        let f = finding();
        let mut store = LearningStore::in_memory();
        store.record(&f, "old fix", true).unwrap();
        store.record(&f, "new fix", true).unwrap();
        store.record(&f, "broken fix", false).unwrap();
        store.record(&f, "newer fix", true).unwrap();
        assert_eq!(store.apply_known(&f), Some(fingerprint("newer fix")));
    }

    #[test]
    fn records_persist_as_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".enforcer").join("learnings.jsonl");
        let f = finding();

        let mut store = LearningStore::open(&path).unwrap();
        store.record(&f, "fix", true).unwrap();
        store.record(&f, "fix", false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        let reopened = LearningStore::open(&path).unwrap();
        assert_eq!(reopened.records(), store.records());
        let stats = reopened.category_stats();
        assert_eq!(
            stats.get("lexical/SRP"),
            Some(&CategoryStats {
                successes: 1,
                failures: 1
            })
        );
        assert_eq!(reopened.tier_for(&f), ConfidenceTier::Unrated);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("learnings.jsonl");
        fs::write(&path, "not json\n\n").unwrap();
        let store = LearningStore::open(&path).unwrap();
        assert!(store.records().is_empty());
    }
}

//! Interfaces to everything outside the engine.
//!
//! The engine never probes for capabilities at runtime: each component takes
//! the collaborators it needs as constructor arguments, optional ones wrapped
//! in `Option<Box<dyn …>>`. A missing or failing collaborator degrades the
//! result (no fix, empty history, no model notes) and is never fatal.

mod git;
mod syntax;

pub use git::{Git2Log, GitCheckoutRollback};
pub use syntax::BlockBalanceChecker;

use crate::core::Severity;
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cost/quality tier requested from a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Balanced,
    Deep,
}

/// Model-assisted text completion: ask a model, get text back.
pub trait ModelClient {
    fn ask(&self, prompt: &str, tier: ModelTier) -> Result<String>;
}

/// Automated fixer for a file. Returns a description of the applied fix.
pub trait Fixer {
    fn fix(&self, path: &Path) -> Result<String>;
}

/// Synchronous yes/no decision from a human or a policy layer.
pub trait ConfirmationGate {
    fn confirm(&self, label: &str, description: &str) -> Result<bool>;
}

/// Restores a file's previous content. Calling it twice is harmless.
pub trait Rollback {
    fn rollback(&self, path: &Path) -> Result<()>;
}

/// The project's own test suite, used as the regression oracle.
pub trait TestRunner {
    /// `Ok(true)` when the whole suite passes
    fn run_tests(&self) -> Result<bool>;

    /// `Ok(true)` when the tests in `path` pass. Defaults to the whole suite.
    fn run_file(&self, path: &Path) -> Result<bool> {
        log::debug!(
            "No per-file runner for {}; running full suite",
            path.display()
        );
        self.run_tests()
    }
}

/// One commit touching a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub id: String,
    pub summary: String,
    pub author: String,
    pub time: DateTime<Utc>,
}

impl std::fmt::Display for CommitSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} ({}, {})",
            self.id,
            self.summary,
            self.author,
            self.time.format("%Y-%m-%d")
        )
    }
}

/// Version-control history reader.
pub trait VcsLog {
    fn recent_log(&self, path: &Path, limit: usize) -> Result<Vec<CommitSummary>>;
}

/// An offense reported by an external style checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleOffense {
    pub rule: String,
    pub message: String,
    pub severity: Severity,
    pub line: Option<usize>,
}

/// Source-language style checker backing the language-specific layer.
pub trait StyleChecker {
    fn check(&self, source: &str, file: &Path) -> Result<Vec<StyleOffense>>;
}

/// Why a source file does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxIssue {
    pub line: Option<usize>,
    pub message: String,
}

impl std::fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Syntax-only check of one source file.
pub trait SyntaxChecker {
    fn check(&self, file: &Path, source: &str) -> std::result::Result<(), SyntaxIssue>;
}

/// Gate that accepts every repair; what `--yes` wires in.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoAccept;

impl ConfirmationGate for AutoAccept {
    fn confirm(&self, _label: &str, _description: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Gate that rejects every repair.
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectAll;

impl ConfirmationGate for RejectAll {
    fn confirm(&self, _label: &str, _description: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Fixer used when no automated fixer is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFixer;

impl Fixer for NoFixer {
    fn fix(&self, _path: &Path) -> Result<String> {
        Err(Error::Unavailable("automated fixer"))
    }
}

/// Rollback used when nothing can restore files; logs and succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRollback;

impl Rollback for NoRollback {
    fn rollback(&self, path: &Path) -> Result<()> {
        log::warn!("No rollback configured; {} left as is", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Suite(bool);

    impl TestRunner for Suite {
        fn run_tests(&self) -> Result<bool> {
            Ok(self.0)
        }
    }

    #[test]
    fn run_file_defaults_to_full_suite() {
        assert!(Suite(true).run_file(Path::new("test/a_test.rb")).unwrap());
        assert!(!Suite(false).run_file(Path::new("test/a_test.rb")).unwrap());
    }

    #[test]
    fn null_objects() {
        assert!(AutoAccept.confirm("x", "y").unwrap());
        assert!(!RejectAll.confirm("x", "y").unwrap());
        assert!(matches!(
            NoFixer.fix(Path::new("a.rb")),
            Err(Error::Unavailable(_))
        ));
        assert!(NoRollback.rollback(Path::new("a.rb")).is_ok());
    }

    #[test]
    fn syntax_issue_display() {
        let issue = SyntaxIssue {
            line: Some(3),
            message: "unexpected 'end'".into(),
        };
        assert_eq!(issue.to_string(), "line 3: unexpected 'end'");
    }
}

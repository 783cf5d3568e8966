//! Cost-ordered bug hunting: syntax, then the paired tests, then history,
//! then the deep analysis.
//!
//! Each level runs only when every cheaper level failed to resolve the file,
//! so a syntax error never pays for a test run or a model call.

pub mod deep;

pub use deep::{DeepAnalyzer, DeepReport};

use crate::collaborators::{
    BlockBalanceChecker, CommitSummary, ModelClient, ModelTier, SyntaxChecker, TestRunner, VcsLog,
};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Commits read at the history level.
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationLevel {
    Syntax,
    Logic,
    History,
    Llm,
}

impl std::fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EscalationLevel::Syntax => "syntax",
            EscalationLevel::Logic => "logic",
            EscalationLevel::History => "history",
            EscalationLevel::Llm => "llm",
        };
        f.write_str(name)
    }
}

/// Where escalation stopped and what that level found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscalationResult {
    pub level: EscalationLevel,
    /// The level located the bug; nothing after it ran
    pub fixed: bool,
    pub error: Option<String>,
    pub history: Vec<CommitSummary>,
    pub report: Option<DeepReport>,
    pub model_notes: Option<String>,
}

impl EscalationResult {
    fn resolved(level: EscalationLevel, error: String) -> Self {
        Self {
            level,
            fixed: true,
            error: Some(error),
            history: Vec::new(),
            report: None,
            model_notes: None,
        }
    }
}

/// Test files that conventionally cover `path`, most specific first.
///
/// `lib/a/b.rb` maps to `test/a/b_test.rb`, `spec/a/b_spec.rb`,
/// `test/b_test.rb` and `spec/b_spec.rb`. A test file maps to itself.
pub fn paired_test_candidates(path: &Path) -> Vec<PathBuf> {
    let Some(stem) = path.file_stem().and_then(OsStr::to_str) else {
        return Vec::new();
    };
    if stem.ends_with("_test") || stem.ends_with("_spec") {
        return vec![path.to_path_buf()];
    }

    let mut dirs: Vec<&OsStr> = path
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|c| match c {
                    Component::Normal(name) => Some(name),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    if dirs
        .first()
        .is_some_and(|first| *first == "lib" || *first == "app")
    {
        dirs.remove(0);
    }
    let nested: PathBuf = dirs.iter().collect();

    let mut candidates = Vec::with_capacity(4);
    for candidate in [
        Path::new("test").join(&nested).join(format!("{stem}_test.rb")),
        Path::new("spec").join(&nested).join(format!("{stem}_spec.rb")),
        Path::new("test").join(format!("{stem}_test.rb")),
        Path::new("spec").join(format!("{stem}_spec.rb")),
    ] {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Runs the escalation levels against one file.
pub struct BugHunter {
    root: PathBuf,
    syntax: Box<dyn SyntaxChecker>,
    tests: Option<Box<dyn TestRunner>>,
    vcs: Option<Box<dyn VcsLog>>,
    model: Option<Box<dyn ModelClient>>,
    deep: DeepAnalyzer,
}

impl BugHunter {
    /// Hunter rooted at the project directory, with the built-in syntax checker.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            syntax: Box::new(BlockBalanceChecker),
            tests: None,
            vcs: None,
            model: None,
            deep: DeepAnalyzer::new(),
        }
    }

    pub fn with_syntax_checker(mut self, checker: Box<dyn SyntaxChecker>) -> Self {
        self.syntax = checker;
        self
    }

    pub fn with_test_runner(mut self, runner: Box<dyn TestRunner>) -> Self {
        self.tests = Some(runner);
        self
    }

    pub fn with_vcs_log(mut self, vcs: Box<dyn VcsLog>) -> Self {
        self.vcs = Some(vcs);
        self
    }

    pub fn with_model(mut self, model: Box<dyn ModelClient>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn hunt(&self, file: &Path, source: &str) -> EscalationResult {
        let _span = tracing::info_span!("hunt", file = %file.display()).entered();

        if let Some(result) = self.check_syntax(file, source) {
            return result;
        }
        if let Some(result) = self.check_logic(file) {
            return result;
        }
        let history = self.read_history(file);
        self.deep_analysis(file, source, history)
    }

    fn check_syntax(&self, file: &Path, source: &str) -> Option<EscalationResult> {
        match self.syntax.check(file, source) {
            Ok(()) => {
                log::debug!("{}: syntax ok", file.display());
                None
            }
            Err(issue) => {
                log::info!("{}: syntax error at {}", file.display(), issue);
                Some(EscalationResult::resolved(
                    EscalationLevel::Syntax,
                    issue.to_string(),
                ))
            }
        }
    }

    fn paired_test(&self, file: &Path) -> Option<PathBuf> {
        let relative = file.strip_prefix(&self.root).unwrap_or(file);
        paired_test_candidates(relative)
            .into_iter()
            .map(|candidate| self.root.join(candidate))
            .find(|candidate| candidate.is_file())
    }

    fn check_logic(&self, file: &Path) -> Option<EscalationResult> {
        let Some(runner) = &self.tests else {
            log::debug!("No test runner configured; skipping logic level");
            return None;
        };
        let Some(test_file) = self.paired_test(file) else {
            log::debug!("No paired test file for {}", file.display());
            return None;
        };

        match runner.run_file(&test_file) {
            Ok(true) => None,
            Ok(false) => {
                log::info!("Paired tests failed: {}", test_file.display());
                Some(EscalationResult::resolved(
                    EscalationLevel::Logic,
                    format!("paired tests failed: {}", test_file.display()),
                ))
            }
            Err(e) => {
                log::warn!("Could not run {}: {}", test_file.display(), e);
                None
            }
        }
    }

    fn read_history(&self, file: &Path) -> Vec<CommitSummary> {
        let Some(vcs) = &self.vcs else {
            return Vec::new();
        };
        vcs.recent_log(file, HISTORY_LIMIT).unwrap_or_else(|e| {
            log::warn!("History unavailable for {}: {}", file.display(), e);
            Vec::new()
        })
    }

    fn deep_analysis(
        &self,
        file: &Path,
        source: &str,
        history: Vec<CommitSummary>,
    ) -> EscalationResult {
        let report = self.deep.analyze(source, file);
        let model_notes = self.model.as_ref().and_then(|model| {
            match model.ask(&deep_prompt(file, source, &report, &history), ModelTier::Deep) {
                Ok(answer) => Some(answer.trim().to_string()),
                Err(e) => {
                    log::warn!("Model notes unavailable for {}: {}", file.display(), e);
                    None
                }
            }
        });

        EscalationResult {
            level: EscalationLevel::Llm,
            fixed: false,
            error: None,
            history,
            report: Some(report),
            model_notes,
        }
    }
}

fn deep_prompt(file: &Path, source: &str, report: &DeepReport, history: &[CommitSummary]) -> String {
    let signatures: Vec<String> = report
        .signatures
        .iter()
        .map(|s| format!("- line {}: {} ({:?})", s.line, s.name, s.confidence))
        .collect();
    let commits: Vec<String> = history.iter().map(|c| format!("- {c}")).collect();
    format!(
        "Find the most likely bug in {file}.\n\n\
         Analysis so far:\n{summary}\n\n\
         Suspicious lines:\n{signatures}\n\n\
         Recent commits:\n{commits}\n\n\
         ```ruby\n{source}\n```\n",
        file = file.display(),
        summary = report.summary(),
        signatures = signatures.join("\n"),
        commits = commits.join("\n"),
        source = source,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn candidates_follow_lib_layout() {
        assert_eq!(
            paired_test_candidates(Path::new("lib/billing/invoice.rb")),
            vec![
                PathBuf::from("test/billing/invoice_test.rb"),
                PathBuf::from("spec/billing/invoice_spec.rb"),
                PathBuf::from("test/invoice_test.rb"),
                PathBuf::from("spec/invoice_spec.rb"),
            ]
        );
    }

    #[test]
    fn flat_files_do_not_repeat_candidates() {
        assert_eq!(
            paired_test_candidates(Path::new("lib/invoice.rb")),
            vec![
                PathBuf::from("test/invoice_test.rb"),
                PathBuf::from("spec/invoice_spec.rb"),
            ]
        );
    }

    #[test]
    fn test_files_pair_with_themselves() {
        assert_eq!(
            paired_test_candidates(Path::new("spec/invoice_spec.rb")),
            vec![PathBuf::from("spec/invoice_spec.rb")]
        );
    }

    #[test]
    fn clean_file_without_collaborators_reaches_llm() {
        let hunter = BugHunter::new("/nonexistent");
        let result = hunter.hunt(Path::new("lib/a.rb"), "def a\n  1\nend\n");
        assert_eq!(result.level, EscalationLevel::Llm);
        assert!(!result.fixed);
        assert!(result.report.is_some());
        assert!(result.model_notes.is_none());
    }

    #[test]
    fn unbalanced_file_stops_at_syntax() {
        let hunter = BugHunter::new("/nonexistent");
        let result = hunter.hunt(Path::new("lib/a.rb"), "def a\n  1\n");
        assert_eq!(result.level, EscalationLevel::Syntax);
        assert!(result.fixed);
        assert!(result.error.is_some());
        assert!(result.report.is_none());
    }
}

pub mod cache;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a finding came from: one of the six layers or one of the three scopes.
///
/// Declaration order doubles as the tie-break order used by
/// [`Report::prioritized`](crate::report::Report::prioritized).
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Literal,
    Lexical,
    Conceptual,
    Semantic,
    Cognitive,
    Language,
    Line,
    Unit,
    Framework,
}

impl Category {
    pub const LAYERS: [Category; 6] = [
        Category::Literal,
        Category::Lexical,
        Category::Conceptual,
        Category::Semantic,
        Category::Cognitive,
        Category::Language,
    ];

    pub const SCOPES: [Category; 3] = [Category::Line, Category::Unit, Category::Framework];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Literal => "literal",
            Category::Lexical => "lexical",
            Category::Conceptual => "conceptual",
            Category::Semantic => "semantic",
            Category::Cognitive => "cognitive",
            Category::Language => "language",
            Category::Line => "line",
            Category::Unit => "unit",
            Category::Framework => "framework",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::LAYERS
            .iter()
            .chain(Self::SCOPES.iter())
            .find(|c| c.as_str().eq_ignore_ascii_case(name.trim()))
            .copied()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Weight used when ordering findings for display and repair.
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Info => 1,
            Severity::Warning => 3,
            Severity::Error => 5,
            Severity::Critical => 10,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "info" | "low" => Some(Severity::Info),
            "warning" | "warn" | "medium" => Some(Severity::Warning),
            "error" | "high" => Some(Severity::Error),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(Severity, &str)] = &[
            (Severity::Info, "info"),
            (Severity::Warning, "warning"),
            (Severity::Error, "error"),
            (Severity::Critical, "critical"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(s, _)| s == self)
            .map(|(_, s)| *s)
            .unwrap_or("unknown");

        write!(f, "{display_str}")
    }
}

/// One detected issue.
///
/// Findings are built once through [`Finding::new`] and the `at_line` /
/// `with_excerpt` builders; nothing mutates them afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub category: Category,
    pub principle: String,
    pub message: String,
    pub severity: Severity,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub excerpt: Option<String>,
}

const MAX_EXCERPT_CHARS: usize = 80;

impl Finding {
    pub fn new(
        category: Category,
        principle: impl Into<String>,
        severity: Severity,
        file: &Path,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            principle: principle.into(),
            message: message.into(),
            severity,
            file: file.to_path_buf(),
            line: None,
            excerpt: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Attach a display excerpt, trimmed and cut to a terminal-friendly width.
    pub fn with_excerpt(mut self, excerpt: &str) -> Self {
        let trimmed = excerpt.trim();
        let cut: String = trimmed.chars().take(MAX_EXCERPT_CHARS).collect();
        self.excerpt = Some(if cut.len() < trimmed.len() {
            format!("{cut}…")
        } else {
            cut
        });
        self
    }

    /// Key under which the learning store groups fix outcomes for this finding.
    pub fn learning_category(&self) -> String {
        format!("{}/{}", self.category, self.principle)
    }

    /// `file:line` label used in logs and confirmation prompts.
    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{}", self.file.display(), line),
            None => self.file.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_impact() {
        assert!(Severity::Critical > Severity::Error);
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert_eq!(Severity::parse("HIGH"), Some(Severity::Error));
        assert_eq!(Severity::parse("bogus"), None);
    }

    #[test]
    fn category_round_trips_through_names() {
        for category in Category::LAYERS.iter().chain(Category::SCOPES.iter()) {
            assert_eq!(Category::parse(category.as_str()), Some(*category));
        }
        assert_eq!(Category::parse(" Lexical "), Some(Category::Lexical));
    }

    #[test]
    fn excerpt_is_trimmed_and_cut() {
        let long = format!("   {}   ", "x".repeat(200));
        let finding = Finding::new(
            Category::Line,
            "KISS",
            Severity::Info,
            Path::new("a.rb"),
            "long",
        )
        .with_excerpt(&long);
        let excerpt = finding.excerpt.unwrap();
        assert!(excerpt.ends_with('…'));
        assert_eq!(excerpt.chars().count(), MAX_EXCERPT_CHARS + 1);
    }

    #[test]
    fn location_includes_line_when_present() {
        let finding = Finding::new(
            Category::Unit,
            "SRP",
            Severity::Warning,
            Path::new("lib/user.rb"),
            "too many methods",
        );
        assert_eq!(finding.location(), "lib/user.rb");
        assert_eq!(finding.at_line(7).location(), "lib/user.rb:7");
    }
}

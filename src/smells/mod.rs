pub mod circular;

use crate::analyzers::{
    code_lines, count_params, method_lengths, method_name, repeated_strings,
    strip_strings_and_comments,
};
use crate::config::{EnforcerConfig, Thresholds};
use crate::core::{Category, Finding, Severity};
use circular::RequireGraph;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

static CHAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:&?\.[a-z_]\w*[?!]?(?:\([^()]*\))?)+").unwrap()
});
static CHAIN_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&?\.[a-z_]\w*[?!]?(?:\([^()]*\))?").unwrap());

/// Represents different types of code smells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmellType {
    GodClass,
    LongMethod,
    LongParameterList,
    MessageChain,
    PrimitiveObsession,
    CyclicDependency,
}

impl SmellType {
    /// Key used in the `[smells.fixes]` table
    pub fn key(&self) -> &'static str {
        match self {
            SmellType::GodClass => "god_class",
            SmellType::LongMethod => "long_method",
            SmellType::LongParameterList => "long_parameter_list",
            SmellType::MessageChain => "message_chain",
            SmellType::PrimitiveObsession => "primitive_obsession",
            SmellType::CyclicDependency => "cyclic_dependency",
        }
    }

    fn default_fix(&self) -> &'static str {
        match self {
            SmellType::GodClass => "Split the file along its responsibilities",
            SmellType::LongMethod => "Extract well-named helper methods",
            SmellType::LongParameterList => "Introduce a parameter object",
            SmellType::MessageChain => "Hide the delegate behind a method on the first receiver",
            SmellType::PrimitiveObsession => "Replace the literal with a constant or value object",
            SmellType::CyclicDependency => "Move the shared code into a module both can require",
        }
    }

    fn category(&self) -> Category {
        match self {
            SmellType::GodClass | SmellType::LongMethod | SmellType::LongParameterList => {
                Category::Unit
            }
            SmellType::MessageChain => Category::Line,
            SmellType::PrimitiveObsession => Category::Lexical,
            SmellType::CyclicDependency => Category::Framework,
        }
    }

    fn principle(&self) -> &'static str {
        match self {
            SmellType::GodClass | SmellType::LongMethod => "SRP",
            SmellType::LongParameterList => "KISS",
            SmellType::MessageChain => "LAW_OF_DEMETER",
            SmellType::PrimitiveObsession => "DRY",
            SmellType::CyclicDependency => "ACYCLIC_DEPENDENCIES",
        }
    }
}

/// A detected code smell with its location and details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSmell {
    pub smell_type: SmellType,
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
    pub severity: Severity,
    pub fix: String,
}

impl CodeSmell {
    pub fn to_finding(&self) -> Finding {
        Finding::new(
            self.smell_type.category(),
            self.smell_type.principle(),
            self.severity,
            &self.file,
            format!("{} Suggested fix: {}", self.message, self.fix),
        )
        .at_line(self.line)
    }
}

/// Over twice the limit escalates from warning to error.
fn severity_for(value: usize, threshold: usize) -> Severity {
    if value > threshold.saturating_mul(2) {
        Severity::Error
    } else {
        Severity::Warning
    }
}

#[derive(Debug, Clone, Default)]
pub struct SmellDetector {
    thresholds: Thresholds,
    fixes: BTreeMap<String, String>,
}

impl SmellDetector {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            fixes: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &EnforcerConfig) -> Self {
        Self::new(config.thresholds.clone()).with_fixes(config.smells.fixes.clone())
    }

    /// Override fix suggestions by smell key (`long_method`, ...)
    pub fn with_fixes(mut self, fixes: BTreeMap<String, String>) -> Self {
        self.fixes = fixes;
        self
    }

    pub fn fix_for(&self, smell_type: SmellType) -> String {
        self.fixes
            .get(smell_type.key())
            .cloned()
            .unwrap_or_else(|| smell_type.default_fix().to_string())
    }

    fn smell(
        &self,
        smell_type: SmellType,
        file: &Path,
        line: usize,
        message: String,
        severity: Severity,
    ) -> CodeSmell {
        CodeSmell {
            smell_type,
            file: file.to_path_buf(),
            line,
            message,
            severity,
            fix: self.fix_for(smell_type),
        }
    }

    /// Per-file smells, ordered by line
    pub fn detect(&self, source: &str, file: &Path) -> Vec<CodeSmell> {
        let t = &self.thresholds;
        let mut smells = Vec::new();

        let line_count = source.lines().count();
        if line_count > t.max_file_lines {
            smells.push(self.smell(
                SmellType::GodClass,
                file,
                1,
                format!(
                    "File has {} lines (threshold: {}).",
                    line_count, t.max_file_lines
                ),
                severity_for(line_count, t.max_file_lines),
            ));
        }

        for span in method_lengths(source) {
            if span.length > t.max_method_lines {
                smells.push(self.smell(
                    SmellType::LongMethod,
                    file,
                    span.start_line,
                    format!(
                        "Method '{}' has {} lines (threshold: {}).",
                        span.name, span.length, t.max_method_lines
                    ),
                    severity_for(span.length, t.max_method_lines),
                ));
            }
        }

        for (line_no, line) in code_lines(source) {
            if let Some(name) = method_name(line) {
                let params = count_params(line);
                if params > t.max_params {
                    smells.push(self.smell(
                        SmellType::LongParameterList,
                        file,
                        line_no,
                        format!(
                            "Method '{}' has {} parameters (threshold: {}).",
                            name, params, t.max_params
                        ),
                        severity_for(params, t.max_params),
                    ));
                }
            }

            let longest = longest_chain(&strip_strings_and_comments(line));
            if longest >= t.max_chain_length {
                smells.push(self.smell(
                    SmellType::MessageChain,
                    file,
                    line_no,
                    format!("Message chain of {longest} calls."),
                    Severity::Warning,
                ));
            }
        }

        for repeated in repeated_strings(source, t.min_string_length, t.min_duplicate_count) {
            let line = first_line_quoting(source, &repeated.value).unwrap_or(1);
            smells.push(self.smell(
                SmellType::PrimitiveObsession,
                file,
                line,
                format!(
                    "String '{}' is repeated {} times.",
                    repeated.value, repeated.count
                ),
                Severity::Info,
            ));
        }

        smells.sort_by_key(|s| s.line);
        smells
    }

    /// Mutual requires across the project
    pub fn detect_cycles(&self, files: &BTreeMap<PathBuf, String>) -> Vec<CodeSmell> {
        RequireGraph::build(files)
            .back_references()
            .into_iter()
            .map(|cycle| {
                self.smell(
                    SmellType::CyclicDependency,
                    &cycle.site.file,
                    cycle.site.line,
                    format!(
                        "'{}' and '{}' require each other.",
                        cycle.first, cycle.second
                    ),
                    Severity::Warning,
                )
            })
            .collect()
    }
}

fn longest_chain(code: &str) -> usize {
    CHAIN
        .find_iter(code)
        .map(|chain| CHAIN_SEGMENT.find_iter(chain.as_str()).count())
        .max()
        .unwrap_or(0)
}

fn first_line_quoting(source: &str, value: &str) -> Option<usize> {
    let double = format!("\"{value}\"");
    let single = format!("'{value}'");
    source
        .lines()
        .position(|line| line.contains(&double) || line.contains(&single))
        .map(|idx| idx + 1)
}

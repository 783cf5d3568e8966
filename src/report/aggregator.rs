use super::{Report, ReportBuilder};
use crate::collaborators::{ModelClient, ModelTier, StyleChecker};
use crate::config::{ConceptualConfig, EnforcerConfig};
use crate::core::{Category, Finding, Severity};
use crate::layers::LayerEngine;
use crate::patterns::principles::{sample_principles, Principle};
use crate::patterns::RuleSet;
use crate::scopes::{self, FrameworkScope};
use crate::smells::SmellDetector;
use crate::suppression::{parse_suppression_comments, SuppressionContext};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Per-run switches for [`Aggregator::analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Run the model-assisted conceptual pass (needs a model client)
    pub conceptual: bool,
    /// Principles sampled for the conceptual pass
    pub sample_size: usize,
    pub seed: u64,
    /// Add smell-detector findings to the deterministic section
    pub include_smells: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self::from_config(&ConceptualConfig::default())
    }
}

impl AnalyzeOptions {
    pub fn from_config(config: &ConceptualConfig) -> Self {
        Self {
            conceptual: false,
            sample_size: config.sample_size,
            seed: config.seed,
            include_smells: false,
        }
    }
}

/// One issue as a model reports it.
#[derive(Debug, Deserialize)]
struct ModelIssue {
    message: String,
    #[serde(default)]
    line: Option<usize>,
    #[serde(default)]
    severity: Option<String>,
}

/// Runs layers, scopes, smells and the optional model pass, and merges
/// everything into one [`Report`].
pub struct Aggregator {
    rules: RuleSet,
    layers: LayerEngine,
    smells: SmellDetector,
    model: Option<Box<dyn ModelClient>>,
}

impl Aggregator {
    pub fn new(rules: RuleSet) -> Self {
        let smells = SmellDetector::new(rules.thresholds().clone());
        Self {
            rules,
            layers: LayerEngine::default(),
            smells,
            model: None,
        }
    }

    pub fn from_config(config: &EnforcerConfig) -> Self {
        let mut aggregator = Self::new(RuleSet::from_config(config));
        aggregator.smells = SmellDetector::from_config(config);
        aggregator
    }

    pub fn with_style_checker(mut self, checker: Box<dyn StyleChecker>) -> Self {
        self.layers = LayerEngine::new(Some(checker));
        self
    }

    pub fn with_model(mut self, model: Box<dyn ModelClient>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_smells(mut self, smells: SmellDetector) -> Self {
        self.smells = smells;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn analyze(&self, code: &str, file: &Path, options: &AnalyzeOptions) -> Report {
        let _span = tracing::info_span!("analyze", file = %file.display()).entered();
        let suppression = parse_suppression_comments(code);
        let mut builder = ReportBuilder::new();
        self.collect_file(code, file, options, &suppression, &mut builder);
        builder.build()
    }

    /// Analyze every file, then add the cross-file framework scope and
    /// require cycles.
    pub fn analyze_project(
        &self,
        files: &BTreeMap<PathBuf, String>,
        options: &AnalyzeOptions,
    ) -> Report {
        let _span = tracing::info_span!("analyze_project", files = files.len()).entered();
        let suppressions: BTreeMap<&Path, SuppressionContext> = files
            .iter()
            .map(|(path, source)| (path.as_path(), parse_suppression_comments(source)))
            .collect();

        let mut builder = ReportBuilder::new();
        for (path, source) in files {
            if let Some(suppression) = suppressions.get(path.as_path()) {
                self.collect_file(source, path, options, suppression, &mut builder);
            }
        }

        let cross_file = FrameworkScope
            .check(files)
            .into_iter()
            .chain(self.smells.detect_cycles(files).into_iter().map(|s| s.to_finding()));
        for finding in cross_file {
            let suppressed = suppressions
                .get(finding.file.as_path())
                .is_some_and(|s| s.suppresses(&finding));
            if !suppressed {
                builder.push_literal(finding);
            }
        }

        let report = builder.build();
        log::info!(
            "Analyzed {} file(s): {} finding(s)",
            files.len(),
            report.summary().total
        );
        report
    }

    fn collect_file(
        &self,
        code: &str,
        file: &Path,
        options: &AnalyzeOptions,
        suppression: &SuppressionContext,
        builder: &mut ReportBuilder,
    ) {
        let mut deterministic = self.layers.check(code, &self.rules, file);
        deterministic.extend(scopes::check_file(code, self.rules.thresholds(), file));
        if options.include_smells {
            deterministic.extend(
                self.smells
                    .detect(code, file)
                    .iter()
                    .map(|smell| smell.to_finding()),
            );
        }

        let mut suppressed = 0usize;
        for finding in deterministic {
            if suppression.suppresses(&finding) {
                suppressed += 1;
            } else {
                builder.push_literal(finding);
            }
        }

        if options.conceptual {
            for finding in self.conceptual_findings(code, file, options) {
                if suppression.suppresses(&finding) {
                    suppressed += 1;
                } else {
                    builder.push_conceptual(finding);
                }
            }
        }

        if suppressed > 0 {
            log::debug!("{suppressed} finding(s) suppressed in {}", file.display());
        }
    }

    fn conceptual_findings(&self, code: &str, file: &Path, options: &AnalyzeOptions) -> Vec<Finding> {
        let Some(model) = &self.model else {
            log::debug!("No model client configured; skipping conceptual pass");
            return Vec::new();
        };

        let mut findings = Vec::new();
        for principle in sample_principles(options.sample_size, options.seed) {
            let prompt = conceptual_prompt(&principle, code, file);
            let answer = match model.ask(&prompt, ModelTier::Balanced) {
                Ok(answer) => answer,
                Err(e) => {
                    log::warn!("Model pass for {} failed: {}", principle.id, e);
                    continue;
                }
            };
            match parse_model_issues(&answer) {
                Some(issues) => findings.extend(issues.into_iter().map(|issue| {
                    let severity = issue
                        .severity
                        .as_deref()
                        .and_then(Severity::parse)
                        .unwrap_or(Severity::Warning);
                    let finding =
                        Finding::new(Category::Conceptual, principle.id, severity, file, issue.message);
                    match issue.line {
                        Some(line) if line > 0 => finding.at_line(line),
                        _ => finding,
                    }
                })),
                None => log::warn!(
                    "Unparseable model answer for {}; skipping",
                    principle.id
                ),
            }
        }
        findings
    }
}

fn conceptual_prompt(principle: &Principle, code: &str, file: &Path) -> String {
    format!(
        "Review {file} against the {id} principle.\n\
         Question: {question}\n\
         Answer with a JSON array only. Each element is an object with \
         \"message\" (string), \"line\" (number, optional) and \"severity\" \
         (info, warning, error or critical). Answer [] when nothing applies.\n\n\
         ```ruby\n{code}\n```\n",
        file = file.display(),
        id = principle.id,
        question = principle.question,
        code = code,
    )
}

/// Pull the JSON array out of a model answer, tolerating prose or code fences around it.
fn parse_model_issues(answer: &str) -> Option<Vec<ModelIssue>> {
    let start = answer.find('[')?;
    let end = answer.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&answer[start..=end]).ok()
}

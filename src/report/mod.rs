//! The aggregated result of one analysis run.

mod aggregator;
pub mod output;

pub use aggregator::{AnalyzeOptions, Aggregator};

use crate::core::{Finding, Severity};
use crate::errors::Result;
use serde::{Deserialize, Serialize};

/// Finding counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub critical: usize,
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub total: usize,
}

impl Summary {
    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
        self.total += 1;
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}

/// Deterministic findings (`literal`) and model-assisted ones (`conceptual`)
/// with their summary. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    literal: Vec<Finding>,
    conceptual: Vec<Finding>,
    summary: Summary,
}

impl Report {
    pub fn literal(&self) -> &[Finding] {
        &self.literal
    }

    pub fn conceptual(&self) -> &[Finding] {
        &self.conceptual
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn is_empty(&self) -> bool {
        self.summary.total == 0
    }

    /// Every finding, deterministic ones first, in insertion order.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.literal.iter().chain(self.conceptual.iter())
    }

    /// Findings by severity (highest first), then category. Ties keep
    /// insertion order.
    pub fn prioritized(&self) -> Vec<&Finding> {
        let mut ordered: Vec<&Finding> = self.findings().collect();
        ordered.sort_by(|a, b| {
            b.severity
                .weight()
                .cmp(&a.severity.weight())
                .then_with(|| a.category.cmp(&b.category))
        });
        ordered
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builds a [`Report`], counting each finding as it is pushed.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    report: Report,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_literal(&mut self, finding: Finding) {
        self.report.summary.record(finding.severity);
        self.report.literal.push(finding);
    }

    pub fn push_conceptual(&mut self, finding: Finding) {
        self.report.summary.record(finding.severity);
        self.report.conceptual.push(finding);
    }

    pub fn build(self) -> Report {
        self.report
    }
}

use super::Layer;
use crate::analyzers::{
    case_variant_groups, classify_line, identifiers, likely_typos, method_lengths, nesting_depth,
    LineKind,
};
use crate::core::{Category, Finding, Severity};
use crate::patterns::RuleSet;
use std::collections::BTreeMap;
use std::path::Path;

/// Naming and shape of the text: duplicate method names, nesting, method
/// length, misspelled identifiers and inconsistent casing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalLayer;

impl Layer for LexicalLayer {
    fn category(&self) -> Category {
        Category::Lexical
    }

    fn check(&self, source: &str, rules: &RuleSet, file: &Path) -> Vec<Finding> {
        let thresholds = rules.thresholds();
        let mut findings = Vec::new();

        findings.extend(duplicate_methods(source, file));

        let depth = nesting_depth(source);
        if depth > thresholds.max_nesting {
            let mut finding = Finding::new(
                Category::Lexical,
                "KISS",
                Severity::Warning,
                file,
                format!(
                    "Nesting depth {} exceeds maximum of {}",
                    depth, thresholds.max_nesting
                ),
            );
            if let Some(line) = first_line_past_depth(source, thresholds.max_nesting) {
                finding = finding.at_line(line);
            }
            findings.push(finding);
        }

        findings.extend(
            method_lengths(source)
                .into_iter()
                .filter(|span| span.length > thresholds.max_method_lines)
                .map(|span| {
                    Finding::new(
                        Category::Lexical,
                        "SRP",
                        Severity::Warning,
                        file,
                        format!(
                            "Method '{}' is too long: {} lines (maximum {})",
                            span.name, span.length, thresholds.max_method_lines
                        ),
                    )
                    .at_line(span.start_line)
                }),
        );

        for (rare, common) in likely_typos(source) {
            let mut finding = Finding::new(
                Category::Lexical,
                "CONSISTENCY",
                Severity::Info,
                file,
                format!("Identifier '{rare}' looks like a misspelling of '{common}'"),
            );
            if let Some(line) = first_line_with_word(source, &rare) {
                finding = finding.at_line(line);
            }
            findings.push(finding);
        }

        for group in case_variant_groups(&identifiers(source)) {
            let mut finding = Finding::new(
                Category::Lexical,
                "CONSISTENCY",
                Severity::Info,
                file,
                format!("Inconsistent identifier casing: {}", group.join(", ")),
            );
            if let Some(line) = group.get(1).and_then(|n| first_line_with_word(source, n)) {
                finding = finding.at_line(line);
            }
            findings.push(finding);
        }

        findings
    }
}

fn duplicate_methods(source: &str, file: &Path) -> Vec<Finding> {
    let mut seen: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for span in method_lengths(source) {
        seen.entry(span.name).or_default().push(span.start_line);
    }

    let mut duplicates: Vec<(String, Vec<usize>)> = seen
        .into_iter()
        .filter(|(_, lines)| lines.len() > 1)
        .collect();
    duplicates.sort_by_key(|(_, lines)| lines[1]);

    duplicates
        .into_iter()
        .map(|(name, lines)| {
            let listed: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
            Finding::new(
                Category::Lexical,
                "DRY",
                Severity::Warning,
                file,
                format!(
                    "Method '{}' is defined {} times (lines {})",
                    name,
                    lines.len(),
                    listed.join(", ")
                ),
            )
            .at_line(lines[1])
        })
        .collect()
}

fn first_line_past_depth(source: &str, limit: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, line) in source.lines().enumerate() {
        match classify_line(line) {
            LineKind::Opener => {
                depth += 1;
                if depth > limit {
                    return Some(idx + 1);
                }
            }
            LineKind::Closer => depth = depth.saturating_sub(1),
            LineKind::Neutral => {}
        }
    }
    None
}

fn first_line_with_word(source: &str, word: &str) -> Option<usize> {
    source
        .lines()
        .position(|line| {
            line.split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .any(|token| token == word)
        })
        .map(|idx| idx + 1)
}

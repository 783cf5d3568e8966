use super::Layer;
use crate::analyzers::{code_lines, line_of_offset};
use crate::core::{Category, Finding};
use crate::patterns::{CompiledRule, RuleScope, RuleSet};
use std::path::Path;

/// Regex rules from the catalog, applied to the whole text or line by line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralLayer;

impl Layer for LiteralLayer {
    fn category(&self) -> Category {
        Category::Literal
    }

    fn check(&self, source: &str, rules: &RuleSet, file: &Path) -> Vec<Finding> {
        rules
            .rules()
            .iter()
            .flat_map(|rule| match rule.spec.scope {
                RuleScope::Text => check_text(rule, source, file),
                RuleScope::Line => check_lines(rule, source, file),
            })
            .collect()
    }
}

fn finding(rule: &CompiledRule, file: &Path, line: usize, text: &str) -> Finding {
    Finding::new(
        Category::Literal,
        rule.spec.principle.as_str(),
        rule.spec.severity,
        file,
        rule.spec.message.as_str(),
    )
    .at_line(line)
    .with_excerpt(text)
}

fn check_text(rule: &CompiledRule, source: &str, file: &Path) -> Vec<Finding> {
    if !rule.pattern.is_match(source) || rule.is_mitigated(source) {
        return Vec::new();
    }

    rule.pattern
        .find_iter(source)
        .map(|m| {
            let line = line_of_offset(source, m.start());
            let text = source.lines().nth(line - 1).unwrap_or(m.as_str());
            finding(rule, file, line, text)
        })
        .collect()
}

fn check_lines(rule: &CompiledRule, source: &str, file: &Path) -> Vec<Finding> {
    code_lines(source)
        .filter(|(_, line)| rule.pattern.is_match(line) && !rule.is_mitigated(line))
        .map(|(line_no, line)| finding(rule, file, line_no, line))
        .collect()
}

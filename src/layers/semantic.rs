use super::Layer;
use crate::analyzers::{code_lines, method_name};
use crate::core::{Category, Finding, Severity};
use crate::patterns::semantic::{
    generic_method_suggestion, is_passive_name, noun_alternatives, LOCAL_ASSIGNMENT,
};
use crate::patterns::RuleSet;
use std::collections::HashSet;
use std::path::Path;

/// Naming meaning: generic verbs, vague nouns and passive-voice names.
#[derive(Debug, Default, Clone, Copy)]
pub struct SemanticLayer;

impl Layer for SemanticLayer {
    fn category(&self) -> Category {
        Category::Semantic
    }

    fn check(&self, source: &str, _rules: &RuleSet, file: &Path) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut seen_variables: HashSet<String> = HashSet::new();

        for (line_no, line) in code_lines(source) {
            if let Some(name) = method_name(line) {
                if let Some(better) = generic_method_suggestion(&name) {
                    findings.push(naming_finding(
                        file,
                        line_no,
                        format!("Method '{name}' has a generic name; consider '{better}'"),
                    ));
                }
                if is_passive_name(&name) {
                    findings.push(naming_finding(
                        file,
                        line_no,
                        format!("Method '{name}' reads in the passive voice"),
                    ));
                }
                continue;
            }

            let Some(variable) = LOCAL_ASSIGNMENT.captures(line).map(|c| c[1].to_string())
            else {
                continue;
            };
            if !seen_variables.insert(variable.clone()) {
                continue;
            }
            if let Some(alternatives) = noun_alternatives(&variable) {
                findings.push(naming_finding(
                    file,
                    line_no,
                    format!(
                        "Variable '{}' is vague; consider '{}'",
                        variable, alternatives[0]
                    ),
                ));
            } else if is_passive_name(&variable) {
                findings.push(naming_finding(
                    file,
                    line_no,
                    format!("Variable '{variable}' reads in the passive voice"),
                ));
            }
        }

        findings
    }
}

fn naming_finding(file: &Path, line: usize, message: String) -> Finding {
    Finding::new(Category::Semantic, "NAMING", Severity::Info, file, message).at_line(line)
}

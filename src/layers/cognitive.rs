use super::Layer;
use crate::analyzers::{classify_line, method_name, LineKind};
use crate::core::{Category, Finding, Severity};
use crate::patterns::cognitive::{
    is_operator_method, FRONT_LOAD_MIN_METHODS, MAX_DISTINCT_GAPS, METHOD_MISSING,
    OPERATOR_CONTEXT, RESPOND_TO_MISSING, TYPE_DECLARATION,
};
use crate::patterns::RuleSet;
use std::collections::BTreeSet;
use std::path::Path;

/// Load on the reader: too many types per file, irregular spacing, surprising
/// operator overloads and dispatch hooks, methods crowded at the top.
#[derive(Debug, Default, Clone, Copy)]
pub struct CognitiveLayer;

impl Layer for CognitiveLayer {
    fn category(&self) -> Category {
        Category::Cognitive
    }

    fn check(&self, source: &str, rules: &RuleSet, file: &Path) -> Vec<Finding> {
        let mut findings = Vec::new();
        let max_types = rules.thresholds().max_types_per_file;

        let types = top_level_types(source);
        if types.len() > max_types {
            findings.push(
                Finding::new(
                    Category::Cognitive,
                    "SRP",
                    Severity::Warning,
                    file,
                    format!(
                        "{} top-level types declared in one file (maximum {})",
                        types.len(),
                        max_types
                    ),
                )
                .at_line(types[max_types]),
            );
        }

        let gaps = blank_gap_sizes(source);
        if gaps.len() > MAX_DISTINCT_GAPS {
            let sizes: Vec<String> = gaps.iter().map(|g| g.to_string()).collect();
            findings.push(Finding::new(
                Category::Cognitive,
                "CONSISTENCY",
                Severity::Info,
                file,
                format!(
                    "Inconsistent vertical spacing: blank-line gaps of {}",
                    sizes.join(", ")
                ),
            ));
        }

        let methods: Vec<(usize, String)> = source
            .lines()
            .enumerate()
            .filter_map(|(idx, line)| method_name(line).map(|name| (idx + 1, name)))
            .collect();

        if !OPERATOR_CONTEXT.is_match(source) {
            for (line, name) in methods.iter().filter(|(_, n)| is_operator_method(n)) {
                findings.push(
                    Finding::new(
                        Category::Cognitive,
                        "LEAST_SURPRISE",
                        Severity::Warning,
                        file,
                        format!("Operator '{name}' overloaded outside a value-object context"),
                    )
                    .at_line(*line),
                );
            }
        }

        if !RESPOND_TO_MISSING.is_match(source) {
            if let Some((line, _)) = methods.iter().find(|(_, n)| n == METHOD_MISSING) {
                findings.push(
                    Finding::new(
                        Category::Cognitive,
                        "LEAST_SURPRISE",
                        Severity::Warning,
                        file,
                        "method_missing defined without respond_to_missing?",
                    )
                    .at_line(*line),
                );
            }
        }

        let total_lines = source.lines().count();
        if methods.len() >= FRONT_LOAD_MIN_METHODS {
            let front = methods
                .iter()
                .filter(|(line, _)| line * 4 <= total_lines)
                .count();
            if front * 2 > methods.len() {
                findings.push(Finding::new(
                    Category::Cognitive,
                    "READABILITY",
                    Severity::Info,
                    file,
                    format!(
                        "{} of {} methods are declared in the first quarter of the file",
                        front,
                        methods.len()
                    ),
                ));
            }
        }

        findings
    }
}

/// Line numbers of class declarations not nested inside another class.
fn top_level_types(source: &str) -> Vec<usize> {
    let mut open: Vec<bool> = Vec::new();
    let mut lines = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        match classify_line(line) {
            LineKind::Opener => {
                let is_type = TYPE_DECLARATION.is_match(line);
                if is_type && !open.iter().any(|inside_type| *inside_type) {
                    lines.push(idx + 1);
                }
                open.push(is_type);
            }
            LineKind::Closer => {
                open.pop();
            }
            LineKind::Neutral => {}
        }
    }
    lines
}

/// Distinct sizes of blank-line runs between code lines.
fn blank_gap_sizes(source: &str) -> BTreeSet<usize> {
    let mut sizes = BTreeSet::new();
    let mut run = 0usize;
    let mut seen_code = false;

    for line in source.lines() {
        if line.trim().is_empty() {
            run += 1;
            continue;
        }
        if seen_code && run > 0 {
            sizes.insert(run);
        }
        seen_code = true;
        run = 0;
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn check(source: &str) -> Vec<Finding> {
        CognitiveLayer.check(source, &RuleSet::builtin(), Path::new("a.rb"))
    }

    #[test]
    fn too_many_top_level_types() {
        let source = indoc! {"
            module Shop
              class A
                class Inner
                end
              end
              class B
              end
              class C
              end
              class D
              end
            end
        "};
        let findings = check(source);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "4 top-level types declared in one file (maximum 3)"
        );
        assert_eq!(findings[0].line, Some(10));
    }

    #[test]
    fn blank_gap_sizes_are_counted_between_code_only() {
        let source = "\n\na\n\nb\n\n\nc\n\n\n\nd\n\n\n\n\n";
        assert_eq!(blank_gap_sizes(source).into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
        let finding = check(source)
            .into_iter()
            .find(|f| f.principle == "CONSISTENCY")
            .expect("spacing finding");
        assert!(finding.message.ends_with("1, 2, 3"));
    }

    #[test]
    fn operator_overload_needs_value_context() {
        let bare = "class Money\n  def +(other)\n  end\nend\n";
        let value = "class Money\n  include Comparable\n  def <=>(other)\n  end\nend\n";
        assert_eq!(check(bare).len(), 1);
        assert!(check(value).is_empty());
    }

    #[test]
    fn method_missing_without_respond_to_missing() {
        let source = indoc! {"
            class Proxy
              def method_missing(name, *args)
                target.send(name, *args)
              end
            end
        "};
        let findings = check(source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(2));

        let paired = format!("{source}\ndef respond_to_missing?(n, p = false) = true\n");
        assert!(check(&paired).is_empty());
    }

    #[test]
    fn front_loaded_methods() {
        let mut source = String::new();
        for name in ["a", "b", "c", "d", "e"] {
            source.push_str(&format!("def {name}; end\n"));
        }
        source.push_str(&"x = 1\n".repeat(20));
        source.push_str("def f; end\n");
        let findings = check(&source);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "5 of 6 methods are declared in the first quarter of the file"
        );
    }
}

use crate::analyzers::{classify_line, count_params, method_name, LineKind};
use crate::config::Thresholds;
use crate::core::{Category, Finding, Severity};
use crate::patterns::semantic::generic_method_suggestion;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static CLASS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:class|module)\s+([A-Z][\w:]*)").unwrap());
static VISIBILITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(private|protected|public)\s*(?:#.*)?$").unwrap());

#[derive(Debug)]
struct OpenMethod {
    name: String,
    start_line: usize,
    depth: usize,
}

#[derive(Debug)]
struct OpenUnit {
    name: String,
    start_line: usize,
    depth: usize,
    public_methods: usize,
    private_section: bool,
}

/// Method and class boundaries, tracked with their own def/end state machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitScope;

impl UnitScope {
    pub fn check(&self, source: &str, thresholds: &Thresholds, file: &Path) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut methods: Vec<OpenMethod> = Vec::new();
        let mut units: Vec<OpenUnit> = Vec::new();
        let mut depth = 0usize;

        for (idx, line) in source.lines().enumerate() {
            let line_no = idx + 1;
            let kind = classify_line(line);

            if let Some(unit) = units.last_mut().filter(|u| depth == u.depth + 1) {
                if let Some(caps) = VISIBILITY.captures(line) {
                    unit.private_section = &caps[1] != "public";
                }
            }

            if let Some(name) = method_name(line) {
                self.check_signature(&name, line, line_no, thresholds, file, &mut findings);
                if let Some(unit) = units.last_mut() {
                    let direct_member = depth == unit.depth + 1;
                    if direct_member && !unit.private_section && !name.starts_with("self.") {
                        unit.public_methods += 1;
                    }
                }
                if kind == LineKind::Opener {
                    methods.push(OpenMethod {
                        name,
                        start_line: line_no,
                        depth,
                    });
                }
            } else if kind == LineKind::Opener {
                if let Some(caps) = CLASS_NAME.captures(line) {
                    units.push(OpenUnit {
                        name: caps[1].to_string(),
                        start_line: line_no,
                        depth,
                        public_methods: 0,
                        private_section: false,
                    });
                }
            }

            match kind {
                LineKind::Opener => depth += 1,
                LineKind::Closer if depth > 0 => {
                    depth -= 1;
                    if methods.last().is_some_and(|m| m.depth == depth) {
                        if let Some(method) = methods.pop() {
                            let length = line_no - method.start_line + 1;
                            if length > thresholds.max_method_lines {
                                findings.push(
                                    Finding::new(
                                        Category::Unit,
                                        "SRP",
                                        Severity::Warning,
                                        file,
                                        format!(
                                            "Method '{}' spans {} lines (maximum {})",
                                            method.name, length, thresholds.max_method_lines
                                        ),
                                    )
                                    .at_line(method.start_line),
                                );
                            }
                        }
                    } else if units.last().is_some_and(|u| u.depth == depth) {
                        if let Some(unit) = units.pop() {
                            if unit.public_methods > thresholds.max_public_methods {
                                findings.push(
                                    Finding::new(
                                        Category::Unit,
                                        "ISP",
                                        Severity::Warning,
                                        file,
                                        format!(
                                            "'{}' exposes {} public methods (maximum {})",
                                            unit.name,
                                            unit.public_methods,
                                            thresholds.max_public_methods
                                        ),
                                    )
                                    .at_line(unit.start_line),
                                );
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        findings.sort_by_key(|f| f.line);
        findings
    }

    fn check_signature(
        &self,
        name: &str,
        line: &str,
        line_no: usize,
        thresholds: &Thresholds,
        file: &Path,
        findings: &mut Vec<Finding>,
    ) {
        let params = count_params(line);
        if params > thresholds.max_params {
            findings.push(
                Finding::new(
                    Category::Unit,
                    "KISS",
                    Severity::Warning,
                    file,
                    format!(
                        "Method '{}' takes {} parameters (maximum {})",
                        name, params, thresholds.max_params
                    ),
                )
                .at_line(line_no),
            );
        }

        if let Some(better) = generic_method_suggestion(name) {
            findings.push(
                Finding::new(
                    Category::Unit,
                    "NAMING",
                    Severity::Info,
                    file,
                    format!("Method '{name}' does not say what it does; consider '{better}'"),
                )
                .at_line(line_no),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn messages(source: &str, thresholds: &Thresholds) -> Vec<String> {
        UnitScope
            .check(source, thresholds, Path::new("a.rb"))
            .into_iter()
            .map(|f| f.message)
            .collect()
    }

    #[test]
    fn long_parameter_list_and_generic_name() {
        let source = "def handle(a, b, c, d, e, f)\nend\n";
        assert_eq!(
            messages(source, &Thresholds::default()),
            vec![
                "Method 'handle' takes 6 parameters (maximum 5)",
                "Method 'handle' does not say what it does; consider 'dispatch'",
            ]
        );
    }

    #[test]
    fn public_methods_stop_counting_after_private() {
        let source = indoc! {"
            class Account
              def a; end
              def b
                if x
                  y
                end
              end
              def self.build; end

              private

              def c; end
              def d; end
            end
        "};
        let thresholds = Thresholds {
            max_public_methods: 1,
            ..Thresholds::default()
        };
        assert_eq!(
            messages(source, &thresholds),
            vec!["'Account' exposes 2 public methods (maximum 1)"]
        );
    }

    #[test]
    fn long_method_uses_own_boundaries() {
        let mut source = String::from("class A\n  def build\n");
        for _ in 0..5 {
            source.push_str("    step\n");
        }
        source.push_str("  end\nend\n");
        let thresholds = Thresholds {
            max_method_lines: 6,
            ..Thresholds::default()
        };
        let findings = UnitScope.check(&source, &thresholds, Path::new("a.rb"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Method 'build' spans 7 lines (maximum 6)");
        assert_eq!(findings[0].line, Some(2));
    }
}

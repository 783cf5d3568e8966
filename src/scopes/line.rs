use crate::config::Thresholds;
use crate::core::{Category, Finding, Severity};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\s*(TODO|FIXME|HACK|XXX)\b").unwrap());
static RESCUE_NIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\brescue\s+nil\b").unwrap());
static BARE_RESCUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*rescue\s*(?:#.*)?$").unwrap());
static END_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*end\b").unwrap());

/// Checks that need nothing but the line itself (and, for empty rescues, the next one).
#[derive(Debug, Default, Clone, Copy)]
pub struct LineScope;

impl LineScope {
    pub fn check(&self, source: &str, thresholds: &Thresholds, file: &Path) -> Vec<Finding> {
        let lines: Vec<&str> = source.lines().collect();
        let mut findings = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            let finding = |principle: &str, severity: Severity, message: String| {
                Finding::new(Category::Line, principle, severity, file, message)
                    .at_line(line_no)
                    .with_excerpt(line)
            };

            if let Some(caps) = MARKER.captures(line) {
                findings.push(finding(
                    "CLEAN_CODE",
                    Severity::Info,
                    format!("{} marker left in code", &caps[1]),
                ));
            }

            if line.ends_with(' ') || line.ends_with('\t') {
                findings.push(finding(
                    "CONSISTENCY",
                    Severity::Info,
                    "Trailing whitespace".to_string(),
                ));
            }

            let length = line.chars().count();
            if length > thresholds.max_line_length {
                findings.push(finding(
                    "READABILITY",
                    Severity::Info,
                    format!(
                        "Line is {} characters (maximum {})",
                        length, thresholds.max_line_length
                    ),
                ));
            }

            if RESCUE_NIL.is_match(line) {
                findings.push(finding(
                    "FAIL_FAST",
                    Severity::Error,
                    "Exception swallowed with 'rescue nil'".to_string(),
                ));
            } else if BARE_RESCUE.is_match(line) && next_code_line_is_end(&lines[idx + 1..]) {
                findings.push(finding(
                    "FAIL_FAST",
                    Severity::Error,
                    "Empty rescue block swallows every error".to_string(),
                ));
            }
        }

        findings
    }
}

fn next_code_line_is_end(rest: &[&str]) -> bool {
    rest.iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .is_some_and(|l| END_LINE.is_match(l))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn messages(source: &str) -> Vec<(usize, String)> {
        LineScope
            .check(source, &Thresholds::default(), Path::new("a.rb"))
            .into_iter()
            .map(|f| (f.line.unwrap_or(0), f.message))
            .collect()
    }

    #[test]
    fn markers_whitespace_and_length() {
        let long = format!("x = {}", "1".repeat(130));
        let source = format!("# FIXME: later\ny = 2 \n{long}\n");
        assert_eq!(
            messages(&source),
            vec![
                (1, "FIXME marker left in code".to_string()),
                (2, "Trailing whitespace".to_string()),
                (3, "Line is 134 characters (maximum 120)".to_string()),
            ]
        );
    }

    #[test]
    fn swallowed_exceptions() {
        let source = indoc! {"
            value = parse(x) rescue nil
            begin
              risky
            rescue
              # ignore
            end
            begin
              risky
            rescue
              log_failure
            end
        "};
        assert_eq!(
            messages(source),
            vec![
                (1, "Exception swallowed with 'rescue nil'".to_string()),
                (4, "Empty rescue block swallows every error".to_string()),
            ]
        );
    }
}

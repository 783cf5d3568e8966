use crate::analyzers::{code_lines, strip_comment};
use crate::core::{Category, Finding, Severity};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

static CONSTANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Z][A-Z0-9_]*)\s*=\s*(.+?)\s*$").unwrap());
static CLASS_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*class\s+([A-Z][\w:]*)").unwrap());

/// Where a declaration was first seen in each file that has it.
type Sightings = BTreeMap<PathBuf, usize>;

/// Cross-file checks over the whole project: duplicated constants and classes
/// declared in more than one file. Grouping is by exact equality.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameworkScope;

impl FrameworkScope {
    pub fn check(&self, files: &BTreeMap<PathBuf, String>) -> Vec<Finding> {
        let mut constants: BTreeMap<(String, String), Sightings> = BTreeMap::new();
        let mut classes: BTreeMap<String, Sightings> = BTreeMap::new();

        for (path, source) in files {
            for (line_no, line) in code_lines(source) {
                let line = strip_comment(line);
                if let Some(caps) = CONSTANT.captures(line) {
                    constants
                        .entry((caps[1].to_string(), caps[2].to_string()))
                        .or_default()
                        .entry(path.clone())
                        .or_insert(line_no);
                }
                if let Some(caps) = CLASS_DECLARATION.captures(line) {
                    classes
                        .entry(caps[1].to_string())
                        .or_default()
                        .entry(path.clone())
                        .or_insert(line_no);
                }
            }
        }

        let mut findings = Vec::new();

        for ((name, value), sightings) in constants.iter().filter(|(_, s)| s.len() > 1) {
            findings.push(group_finding(
                "DRY",
                sightings,
                format!(
                    "Constant {} = {} is defined in {} files: {}",
                    name,
                    value,
                    sightings.len(),
                    file_list(sightings)
                ),
            ));
        }

        for (name, sightings) in classes.iter().filter(|(_, s)| s.len() > 1) {
            findings.push(group_finding(
                "SRP",
                sightings,
                format!(
                    "Class {} is declared in {} files: {}",
                    name,
                    sightings.len(),
                    file_list(sightings)
                ),
            ));
        }

        log::debug!(
            "Framework scope: {} finding(s) across {} file(s)",
            findings.len(),
            files.len()
        );
        findings
    }
}

fn file_list(sightings: &Sightings) -> String {
    sightings
        .keys()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn group_finding(principle: &str, sightings: &Sightings, message: String) -> Finding {
    let (first_file, first_line) = sightings
        .iter()
        .next()
        .map(|(path, line)| (path.as_path(), *line))
        .unwrap_or((Path::new(""), 1));
    Finding::new(
        Category::Framework,
        principle,
        Severity::Warning,
        first_file,
        message,
    )
    .at_line(first_line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn project(files: &[(&str, &str)]) -> BTreeMap<PathBuf, String> {
        files
            .iter()
            .map(|(path, source)| (PathBuf::from(path), source.to_string()))
            .collect()
    }

    #[test]
    fn identical_constant_in_two_files_reported_once() {
        let files = project(&[
            ("lib/a.rb", "MAX = 5\n"),
            ("lib/b.rb", "class B\n  MAX = 5\nend\n"),
        ]);
        let findings = FrameworkScope.check(&files);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Constant MAX = 5 is defined in 2 files: lib/a.rb, lib/b.rb"
        );
        assert_eq!(findings[0].file, PathBuf::from("lib/a.rb"));
        assert_eq!(findings[0].category, Category::Framework);
    }

    #[test]
    fn different_values_are_not_duplicates() {
        let files = project(&[("lib/a.rb", "MAX = 5\n"), ("lib/b.rb", "MAX = 6\n")]);
        assert!(FrameworkScope.check(&files).is_empty());
    }

    #[test]
    fn same_constant_twice_in_one_file_is_not_cross_file() {
        let files = project(&[("lib/a.rb", "MAX = 5\nMAX = 5\n")]);
        assert!(FrameworkScope.check(&files).is_empty());
    }

    #[test]
    fn class_declared_in_two_files() {
        let files = project(&[
            ("app/user.rb", "class User\nend\n"),
            ("lib/user.rb", "class User < Base\nend\n"),
            ("lib/other.rb", "class Other\nend\n"),
        ]);
        let findings = FrameworkScope.check(&files);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Class User is declared in 2 files: app/user.rb, lib/user.rb"
        );
    }
}

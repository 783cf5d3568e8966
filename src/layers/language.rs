use super::Layer;
use crate::collaborators::StyleChecker;
use crate::core::{Category, Finding};
use crate::patterns::RuleSet;
use std::path::Path;

/// Delegates to an external style checker, if one is configured.
pub struct LanguageLayer {
    checker: Option<Box<dyn StyleChecker>>,
}

impl LanguageLayer {
    pub fn new(checker: Option<Box<dyn StyleChecker>>) -> Self {
        Self { checker }
    }
}

impl Layer for LanguageLayer {
    fn category(&self) -> Category {
        Category::Language
    }

    fn check(&self, source: &str, _rules: &RuleSet, file: &Path) -> Vec<Finding> {
        let Some(checker) = &self.checker else {
            return Vec::new();
        };

        match checker.check(source, file) {
            Ok(offenses) => offenses
                .into_iter()
                .map(|offense| {
                    let finding = Finding::new(
                        Category::Language,
                        "STYLE",
                        offense.severity,
                        file,
                        format!("{}: {}", offense.rule, offense.message),
                    );
                    match offense.line {
                        Some(line) => finding.at_line(line),
                        None => finding,
                    }
                })
                .collect(),
            Err(e) => {
                log::warn!("Style checker failed on {}: {}", file.display(), e);
                Vec::new()
            }
        }
    }
}

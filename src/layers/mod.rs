//! The six analytical layers.
//!
//! Each layer looks at the same source text from a different angle and
//! produces its own findings. Layers share nothing but the [`RuleSet`], so
//! they run independently; the engine concatenates their output in a fixed
//! order and never deduplicates across layers.

mod cognitive;
mod conceptual;
mod language;
mod lexical;
mod literal;
mod semantic;

pub use cognitive::CognitiveLayer;
pub use conceptual::ConceptualLayer;
pub use language::LanguageLayer;
pub use lexical::LexicalLayer;
pub use literal::LiteralLayer;
pub use semantic::SemanticLayer;

use crate::collaborators::StyleChecker;
use crate::core::{Category, Finding};
use crate::patterns::RuleSet;
use std::path::Path;

/// One analytical layer.
pub trait Layer {
    fn category(&self) -> Category;

    fn check(&self, source: &str, rules: &RuleSet, file: &Path) -> Vec<Finding>;
}

/// Runs every layer in order: literal, lexical, conceptual, semantic,
/// cognitive, language.
pub struct LayerEngine {
    layers: Vec<Box<dyn Layer>>,
}

impl Default for LayerEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl LayerEngine {
    pub fn new(style_checker: Option<Box<dyn StyleChecker>>) -> Self {
        Self {
            layers: vec![
                Box::new(LiteralLayer),
                Box::new(LexicalLayer),
                Box::new(ConceptualLayer),
                Box::new(SemanticLayer),
                Box::new(CognitiveLayer),
                Box::new(LanguageLayer::new(style_checker)),
            ],
        }
    }

    pub fn categories(&self) -> Vec<Category> {
        self.layers.iter().map(|layer| layer.category()).collect()
    }

    pub fn check(&self, source: &str, rules: &RuleSet, file: &Path) -> Vec<Finding> {
        let mut findings = Vec::new();
        for layer in &self.layers {
            let found = layer.check(source, rules, file);
            log::debug!(
                "{} layer: {} finding(s) in {}",
                layer.category(),
                found.len(),
                file.display()
            );
            findings.extend(found);
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::StyleOffense;
    use crate::core::Severity;
    use crate::errors::Result;

    struct OneOffense;

    impl StyleChecker for OneOffense {
        fn check(&self, _source: &str, _file: &Path) -> Result<Vec<StyleOffense>> {
            Ok(vec![StyleOffense {
                rule: "Style/StringLiterals".into(),
                message: "prefer single quotes".into(),
                severity: Severity::Info,
                line: Some(1),
            }])
        }
    }

    #[test]
    fn layers_run_in_fixed_order() {
        assert_eq!(LayerEngine::default().categories(), Category::LAYERS.to_vec());
    }

    #[test]
    fn findings_are_grouped_by_layer_order() {
        let source = "$counter = 0\nx = \"a\"\n";
        let engine = LayerEngine::new(Some(Box::new(OneOffense)));
        let findings = engine.check(source, &RuleSet::builtin(), Path::new("a.rb"));

        let categories: Vec<Category> = findings.iter().map(|f| f.category).collect();
        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);
        assert_eq!(categories.first(), Some(&Category::Literal));
        assert_eq!(categories.last(), Some(&Category::Language));
    }
}

//! Pattern catalog: declarative detection rules and dictionaries.
//!
//! Literal rules are data (`RuleSpec`) compiled once into a [`RuleSet`]; the
//! remaining tables feed the structural, semantic and cognitive layers and the
//! model-assisted conceptual pass.

pub mod cognitive;
pub mod literal;
pub mod principles;
pub mod semantic;
pub mod structural;

use crate::config::{load_config_from_path, EnforcerConfig, Thresholds};
use crate::core::cache::MtimeCache;
use crate::core::Severity;
use crate::errors::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What text a rule's pattern is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    /// Each line separately; a negative pattern is checked against the same line
    #[default]
    Line,
    /// The whole file; a negative pattern anywhere in the file suppresses the rule
    Text,
}

/// Declarative rule as written in the catalog or in `.enforcer.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub pattern: String,
    pub principle: String,
    #[serde(default = "default_rule_severity")]
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub negative_pattern: Option<String>,
    #[serde(default)]
    pub scope: RuleScope,
}

fn default_rule_severity() -> Severity {
    Severity::Warning
}

impl RuleSpec {
    pub fn new(
        name: &str,
        pattern: &str,
        principle: &str,
        severity: Severity,
        message: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            principle: principle.to_string(),
            severity,
            message: message.to_string(),
            negative_pattern: None,
            scope: RuleScope::Line,
        }
    }

    pub fn unless(mut self, negative_pattern: &str) -> Self {
        self.negative_pattern = Some(negative_pattern.to_string());
        self
    }

    pub fn whole_text(mut self) -> Self {
        self.scope = RuleScope::Text;
        self
    }
}

/// A rule with its patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub spec: RuleSpec,
    pub pattern: Regex,
    pub negative: Option<Regex>,
}

impl CompiledRule {
    pub fn compile(spec: RuleSpec) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| Error::Regex {
                rule: spec.name.clone(),
                source,
            })
        };
        let pattern = compile(&spec.pattern)?;
        let negative = spec.negative_pattern.as_deref().map(compile).transpose()?;
        Ok(Self {
            spec,
            pattern,
            negative,
        })
    }

    /// Whether the negative pattern (if any) matches `text`, suppressing the rule there.
    pub fn is_mitigated(&self, text: &str) -> bool {
        self.negative.as_ref().is_some_and(|neg| neg.is_match(text))
    }
}

/// Compiled rules plus the thresholds the layers consult. Read-only for a run.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    thresholds: Thresholds,
    skipped: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleSet {
    /// Built-in catalog with default thresholds
    pub fn builtin() -> Self {
        Self::from_specs(literal::builtin_rules(), Thresholds::default())
    }

    /// Compile `specs`, logging and skipping any rule whose pattern is invalid.
    pub fn from_specs(specs: Vec<RuleSpec>, thresholds: Thresholds) -> Self {
        let mut rules = Vec::with_capacity(specs.len());
        let mut skipped = Vec::new();

        for spec in specs {
            let name = spec.name.clone();
            match CompiledRule::compile(spec) {
                Ok(rule) => rules.push(rule),
                Err(e) => {
                    log::warn!("Skipping rule: {e}");
                    skipped.push(name);
                }
            }
        }

        Self {
            rules,
            thresholds,
            skipped,
        }
    }

    /// Built-in rules overlaid with configured ones; a configured rule replaces
    /// a built-in rule of the same name.
    pub fn from_config(config: &EnforcerConfig) -> Self {
        let mut specs = literal::builtin_rules();
        for custom in &config.rules {
            match specs.iter_mut().find(|s| s.name == custom.name) {
                Some(existing) => *existing = custom.clone(),
                None => specs.push(custom.clone()),
            }
        }
        Self::from_specs(specs, config.thresholds.clone())
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Names of rules dropped because their patterns did not compile
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

/// Compiled rule set cached against the config file it was built from.
pub type RuleCache = MtimeCache<RuleSet>;

pub fn cached_rules(cache: &mut RuleCache) -> &RuleSet {
    cache.get_or_load(|path| RuleSet::from_config(&load_config_from_path(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_rule_is_skipped_not_fatal() {
        let specs = vec![
            RuleSpec::new("ok", r"\bsleep\b", "PERFORMANCE", Severity::Warning, "sleep"),
            RuleSpec::new("broken", r"(unclosed", "KISS", Severity::Info, "never"),
        ];
        let rules = RuleSet::from_specs(specs, Thresholds::default());
        assert_eq!(rules.rules().len(), 1);
        assert_eq!(rules.skipped(), ["broken".to_string()]);
    }

    #[test]
    fn invalid_negative_pattern_skips_rule() {
        let spec = RuleSpec::new("neg", "x", "KISS", Severity::Info, "x").unless("[");
        assert!(matches!(
            CompiledRule::compile(spec),
            Err(Error::Regex { ref rule, .. }) if rule == "neg"
        ));
    }

    #[test]
    fn cached_rules_rebuild_only_when_config_changes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(crate::config::CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[[rules]]\nname = \"no-puts\"\npattern = \"\\\\bputs\\\\b\"\nprinciple = \"CLARITY\"\nmessage = \"log instead\"\n",
        )
        .unwrap();

        let mut cache = RuleCache::new(&path);
        let count = cached_rules(&mut cache).rules().len();
        assert_eq!(count, literal::builtin_rules().len() + 1);
        assert_eq!(cached_rules(&mut cache).rules().len(), count);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn builtin_catalog_compiles_cleanly() {
        let rules = RuleSet::builtin();
        assert!(rules.skipped().is_empty());
        assert_eq!(rules.rules().len(), literal::builtin_rules().len());
    }

    #[test]
    fn configured_rule_overrides_builtin_by_name() {
        let mut config = EnforcerConfig::default();
        config.rules.push(RuleSpec::new(
            "fixed-sleep",
            r"\bsleep\b",
            "PERFORMANCE",
            Severity::Error,
            "no sleeping",
        ));
        let rules = RuleSet::from_config(&config);
        let sleep = rules
            .rules()
            .iter()
            .find(|r| r.spec.name == "fixed-sleep")
            .unwrap();
        assert_eq!(sleep.spec.severity, Severity::Error);
        assert_eq!(rules.rules().len(), literal::builtin_rules().len());
    }
}

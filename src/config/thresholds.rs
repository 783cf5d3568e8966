use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Numeric limits consulted by the analyzers, layers, scopes and smell detector.
///
/// All limits are exclusive: a value is reported only when it goes *over* the limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_max_method_lines")]
    pub max_method_lines: usize,

    #[serde(default = "default_max_file_lines")]
    pub max_file_lines: usize,

    #[serde(default = "default_max_params")]
    pub max_params: usize,

    #[serde(default = "default_max_nesting")]
    pub max_nesting: usize,

    #[serde(default = "default_max_public_methods")]
    pub max_public_methods: usize,

    /// Minimum number of occurrences before a string literal counts as repeated
    #[serde(default = "default_min_duplicate_count")]
    pub min_duplicate_count: usize,

    /// Shortest string literal considered by repeated-string detection
    #[serde(default = "default_min_string_length")]
    pub min_string_length: usize,

    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    #[serde(default = "default_max_types_per_file")]
    pub max_types_per_file: usize,

    /// Chained member accesses at or above this count form a message chain
    #[serde(default = "default_max_chain_length")]
    pub max_chain_length: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_method_lines: default_max_method_lines(),
            max_file_lines: default_max_file_lines(),
            max_params: default_max_params(),
            max_nesting: default_max_nesting(),
            max_public_methods: default_max_public_methods(),
            min_duplicate_count: default_min_duplicate_count(),
            min_string_length: default_min_string_length(),
            max_line_length: default_max_line_length(),
            max_types_per_file: default_max_types_per_file(),
            max_chain_length: default_max_chain_length(),
        }
    }
}

impl Thresholds {
    /// Tighter limits for codebases that are already in good shape
    pub fn strict() -> Self {
        Self {
            max_method_lines: 25,
            max_file_lines: 200,
            max_params: 3,
            max_nesting: 3,
            max_public_methods: 10,
            min_duplicate_count: 2,
            ..Self::default()
        }
    }

    /// Every limit must be positive, otherwise every line of code is a finding.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("max_method_lines", self.max_method_lines),
            ("max_file_lines", self.max_file_lines),
            ("max_params", self.max_params),
            ("max_nesting", self.max_nesting),
            ("max_public_methods", self.max_public_methods),
            ("min_duplicate_count", self.min_duplicate_count),
            ("min_string_length", self.min_string_length),
            ("max_line_length", self.max_line_length),
            ("max_types_per_file", self.max_types_per_file),
            ("max_chain_length", self.max_chain_length),
        ];

        match limits.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(Error::Config(format!(
                "threshold '{name}' must be greater than zero"
            ))),
            None => Ok(()),
        }
    }
}

fn default_max_method_lines() -> usize {
    50
}
fn default_max_file_lines() -> usize {
    300
}
fn default_max_params() -> usize {
    5
}
fn default_max_nesting() -> usize {
    4
}
fn default_max_public_methods() -> usize {
    20
}
fn default_min_duplicate_count() -> usize {
    3
}
fn default_min_string_length() -> usize {
    3
}
fn default_max_line_length() -> usize {
    120
}
fn default_max_types_per_file() -> usize {
    3
}
fn default_max_chain_length() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_table_keeps_defaults() {
        let thresholds: Thresholds = toml::from_str("max_method_lines = 30").unwrap();
        assert_eq!(thresholds.max_method_lines, 30);
        assert_eq!(thresholds.max_params, 5);
        assert_eq!(thresholds.max_nesting, 4);
    }

    #[test]
    fn zero_limit_is_rejected() {
        let thresholds = Thresholds {
            max_nesting: 0,
            ..Thresholds::default()
        };
        assert_eq!(
            thresholds.validate().unwrap_err().to_string(),
            "Configuration error: threshold 'max_nesting' must be greater than zero"
        );
        assert!(Thresholds::strict().validate().is_ok());
    }
}

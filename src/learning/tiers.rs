use serde::{Deserialize, Serialize};

/// Fewer applications than this leave a category unrated.
pub const MIN_APPLICATIONS: usize = 3;

const PROMOTE_RATE: f64 = 0.85;
const KEEP_RATE: f64 = 0.60;
const DEMOTE_RATE: f64 = 0.30;

/// How much a category's recorded fixes can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Unrated,
    Promote,
    Keep,
    Demote,
    Retire,
}

impl ConfidenceTier {
    pub fn classify(successes: usize, failures: usize) -> Self {
        let applications = successes + failures;
        if applications < MIN_APPLICATIONS {
            return ConfidenceTier::Unrated;
        }

        let rate = successes as f64 / applications as f64;
        if rate >= PROMOTE_RATE {
            ConfidenceTier::Promote
        } else if rate >= KEEP_RATE {
            ConfidenceTier::Keep
        } else if rate >= DEMOTE_RATE {
            ConfidenceTier::Demote
        } else {
            ConfidenceTier::Retire
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::Unrated => "unrated",
            ConfidenceTier::Promote => "promote",
            ConfidenceTier::Keep => "keep",
            ConfidenceTier::Demote => "demote",
            ConfidenceTier::Retire => "retire",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

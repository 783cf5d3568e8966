// Export modules for library usage
pub mod analyzers;
pub mod cli;
pub mod collaborators;
pub mod commands;
pub mod config;
pub mod core;
pub mod errors;
pub mod hunt;
pub mod io;
pub mod layers;
pub mod learning;
pub mod patterns;
pub mod repair;
pub mod report;
pub mod scopes;
pub mod smells;
pub mod suppression;

// Re-export commonly used types
pub use crate::core::{Category, Finding, Severity};
pub use crate::errors::{Error, Result};

pub use crate::config::{load_config, EnforcerConfig, Thresholds};

pub use crate::report::output::{create_writer, OutputFormat, OutputWriter};
pub use crate::report::{AnalyzeOptions, Aggregator, Report, ReportBuilder, Summary};

pub use crate::smells::{CodeSmell, SmellDetector, SmellType};
pub use crate::suppression::{parse_suppression_comments, SuppressionContext};

pub use crate::hunt::{BugHunter, EscalationLevel, EscalationResult};
pub use crate::learning::{ConfidenceTier, LearningStore};
pub use crate::repair::{RepairLoop, RepairOptions, RepairOutcome};

use crate::core::Severity;
use crate::report::output;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "enforcer")]
#[command(about = "Layered code-quality enforcement with a learning repair loop", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v: info, -vv: debug). RUST_LOG overrides.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Config file (defaults to the nearest .enforcer.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every layer and scope and print the report
    Analyze {
        /// Files or directories to analyze
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Request the model-assisted conceptual pass
        #[arg(long)]
        conceptual: bool,

        /// Add smell-detector findings to the report
        #[arg(long)]
        smells: bool,

        /// Exit with status 1 when a finding at or above this severity is reported
        #[arg(long = "fail-on", value_enum)]
        fail_on: Option<SeverityArg>,
    },

    /// Detect code smells, including require cycles
    Smells {
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Escalate through syntax, tests, history and deep analysis for one file
    Hunt {
        file: PathBuf,

        /// Print the escalation result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Walk the report's findings through the repair loop (dry run unless --apply)
    Repair {
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Attempt repairs instead of previewing them
        #[arg(long)]
        apply: bool,

        /// Accept every repair without prompting
        #[arg(short = 'y', long = "yes")]
        yes: bool,

        /// Learning store (defaults to [learning] store_path)
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Write a default .enforcer.toml in the current directory
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Show recorded fix outcomes and confidence tiers by category
    Learn {
        #[arg(long)]
        store: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

impl From<OutputFormat> for output::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => output::OutputFormat::Json,
            OutputFormat::Markdown => output::OutputFormat::Markdown,
            OutputFormat::Terminal => output::OutputFormat::Terminal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityArg {
    Info,
    Warning,
    Error,
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Error => Severity::Error,
            SeverityArg::Critical => Severity::Critical,
        }
    }
}

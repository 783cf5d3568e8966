use super::write_report;
use crate::config::EnforcerConfig;
use crate::core::Severity;
use crate::io::{discover_sources, read_sources};
use crate::report::output::OutputFormat;
use crate::report::{AnalyzeOptions, Aggregator, ReportBuilder};
use crate::smells::SmellDetector;
use anyhow::Result;
use std::path::PathBuf;

pub struct AnalyzeArgs {
    pub paths: Vec<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub conceptual: bool,
    pub smells: bool,
    pub fail_on: Option<Severity>,
}

/// Analyze the sources and write the report. Returns whether any finding
/// reached the `fail_on` severity.
pub fn handle_analyze(config: &EnforcerConfig, args: AnalyzeArgs) -> Result<bool> {
    let files = discover_sources(&args.paths, &config.ignore);
    let sources = read_sources(&files);
    if sources.is_empty() {
        log::warn!("No source files found");
    }

    let mut options = AnalyzeOptions::from_config(&config.conceptual);
    options.include_smells = args.smells;
    if args.conceptual {
        log::warn!("No model client is configured for the command line; skipping the conceptual pass");
    }

    let report = Aggregator::from_config(config).analyze_project(&sources, &options);
    write_report(&report, args.format, args.output.as_deref())?;

    Ok(args
        .fail_on
        .is_some_and(|limit| report.findings().any(|f| f.severity >= limit)))
}

pub fn handle_smells(config: &EnforcerConfig, paths: &[PathBuf], format: OutputFormat) -> Result<()> {
    let files = discover_sources(paths, &config.ignore);
    let sources = read_sources(&files);
    let detector = SmellDetector::from_config(config);

    let mut builder = ReportBuilder::new();
    for (path, source) in &sources {
        for smell in detector.detect(source, path) {
            builder.push_literal(smell.to_finding());
        }
    }
    for smell in detector.detect_cycles(&sources) {
        builder.push_literal(smell.to_finding());
    }

    write_report(&builder.build(), format, None)
}

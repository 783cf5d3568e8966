use super::search_start;
use crate::collaborators::{AutoAccept, ConfirmationGate, GitCheckoutRollback};
use crate::config::EnforcerConfig;
use crate::core::Finding;
use crate::errors::{Error, Result as EnforcerResult};
use crate::io::{discover_sources, read_sources};
use crate::learning::LearningStore;
use crate::repair::{RepairLoop, RepairOptions, RepairOutcome};
use crate::report::{AnalyzeOptions, Aggregator};
use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

pub struct RepairArgs {
    pub paths: Vec<PathBuf>,
    pub apply: bool,
    pub yes: bool,
    pub store: Option<PathBuf>,
}

/// Asks on the terminal before each repair. Anything but `y`/`yes` rejects.
struct TerminalGate;

impl ConfirmationGate for TerminalGate {
    fn confirm(&self, label: &str, description: &str) -> EnforcerResult<bool> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "Repair {label}: {description}? [y/N] ")
            .and_then(|_| stdout.flush())
            .map_err(|e| Error::io("<stdout>", e))?;

        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .map_err(|e| Error::io("<stdin>", e))?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

pub fn handle_repair(config: &EnforcerConfig, args: RepairArgs) -> Result<RepairOutcome> {
    let files = discover_sources(&args.paths, &config.ignore);
    let sources = read_sources(&files);
    let report = Aggregator::from_config(config)
        .analyze_project(&sources, &AnalyzeOptions::from_config(&config.conceptual));
    let findings: Vec<Finding> = report.prioritized().into_iter().cloned().collect();

    let store_path = args
        .store
        .unwrap_or_else(|| config.learning.store_path.clone());
    let store = LearningStore::open(&store_path)?;

    let gate: Box<dyn ConfirmationGate> = if args.yes {
        Box::new(AutoAccept)
    } else {
        Box::new(TerminalGate)
    };
    let mut repair = RepairLoop::new(store).with_gate(gate);
    match GitCheckoutRollback::open(&search_start(&args.paths)) {
        Ok(rollback) => repair = repair.with_rollback(Box::new(rollback)),
        Err(e) => log::warn!("No git rollback available: {e}"),
    }

    let options = RepairOptions {
        dry_run: !args.apply,
        auto_confirm: args.yes,
    };
    let outcome = repair.run(&findings, &options);

    println!(
        "{} repaired, {} failed, {} skipped of {} finding(s)",
        outcome.repaired, outcome.failed, outcome.skipped, outcome.total
    );
    if options.dry_run && outcome.total > 0 {
        println!("Dry run: pass --apply to attempt repairs");
    }
    Ok(outcome)
}

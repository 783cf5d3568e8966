use crate::collaborators::Git2Log;
use crate::hunt::{BugHunter, EscalationResult};
use crate::io::read_file;
use anyhow::Result;
use colored::*;
use std::io::{self, Write};
use std::path::Path;

pub fn handle_hunt(file: &Path, json: bool) -> Result<()> {
    let source = read_file(file)?;
    let start = file.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));

    let hunter = match Git2Log::open(start) {
        Ok(log) => BugHunter::new(log.repo_path().to_path_buf()).with_vcs_log(Box::new(log)),
        Err(e) => {
            log::debug!("No git history for {}: {}", file.display(), e);
            BugHunter::new(std::env::current_dir()?)
        }
    };
    let resolved = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
    let result = hunter.hunt(&resolved, &source);

    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        write_escalation(&mut out, file, &result)?;
    }
    Ok(())
}

fn write_escalation<W: Write>(out: &mut W, file: &Path, result: &EscalationResult) -> Result<()> {
    let status = if result.fixed {
        "bug located".red().bold()
    } else {
        "no bug located".yellow()
    };
    writeln!(out, "{}: stopped at {} ({})", file.display(), result.level, status)?;
    if let Some(error) = &result.error {
        writeln!(out, "  {error}")?;
    }

    if !result.history.is_empty() {
        writeln!(out, "\n{}", "Recent commits".bold())?;
        for commit in &result.history {
            writeln!(out, "  {commit}")?;
        }
    }

    if let Some(report) = &result.report {
        writeln!(out, "\n{}", "Deep analysis".bold())?;
        for line in report.summary().lines() {
            writeln!(out, "  {line}")?;
        }
        for assumption in &report.assumptions {
            writeln!(
                out,
                "  line {}: {} ({})",
                assumption.line,
                assumption.kind.description(),
                assumption.excerpt.dimmed()
            )?;
        }
        for signature in &report.signatures {
            writeln!(
                out,
                "  line {}: {} [{:?}] {}",
                signature.line, signature.name, signature.confidence, signature.fix
            )?;
        }
        let verified = if report.verification.verified {
            "verified".green()
        } else {
            "incomplete".red()
        };
        writeln!(out, "  {}: {}", verified, report.verification.notes.join("; "))?;
    }

    if let Some(notes) = &result.model_notes {
        writeln!(out, "\n{}\n{}", "Model notes".bold(), notes)?;
    }
    Ok(())
}

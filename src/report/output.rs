use super::Report;
use crate::core::{Finding, Severity};
use colored::*;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()>;
}

/// Writer for `format`, wrapping `out`.
pub fn create_writer<'a, W: Write + 'a>(format: OutputFormat, out: W) -> Box<dyn OutputWriter + 'a> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(out)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(out)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(out)),
    }
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_summary(&mut self, report: &Report) -> anyhow::Result<()> {
        let summary = report.summary();
        writeln!(self.writer, "## Summary")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Severity | Count |")?;
        writeln!(self.writer, "|----------|-------|")?;
        for severity in [
            Severity::Critical,
            Severity::Error,
            Severity::Warning,
            Severity::Info,
        ] {
            writeln!(self.writer, "| {} | {} |", severity, summary.count(severity))?;
        }
        writeln!(self.writer, "| **total** | **{}** |", summary.total)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_section(&mut self, title: &str, findings: &[Finding]) -> anyhow::Result<()> {
        if findings.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "## {} ({} findings)", title, findings.len())?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Location | Severity | Category | Principle | Message |")?;
        writeln!(self.writer, "|----------|----------|----------|-----------|---------|")?;
        for finding in findings {
            writeln!(
                self.writer,
                "| `{}` | {} | {} | {} | {} |",
                finding.location(),
                finding.severity,
                finding.category,
                finding.principle,
                finding.message.replace('|', "\\|")
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()> {
        writeln!(self.writer, "# Enforcer Report")?;
        writeln!(self.writer)?;
        self.write_summary(report)?;
        self.write_section("Deterministic", report.literal())?;
        self.write_section("Conceptual", report.conceptual())?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

fn severity_label(severity: Severity) -> ColoredString {
    let label = format!("{:<8}", severity.to_string().to_uppercase());
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::Error => label.red(),
        Severity::Warning => label.yellow(),
        Severity::Info => label.blue(),
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()> {
        if report.is_empty() {
            writeln!(self.writer, "{}", "No findings.".green())?;
            return Ok(());
        }

        for finding in report.prioritized() {
            writeln!(
                self.writer,
                "{} {} [{}/{}] {}",
                severity_label(finding.severity),
                finding.location().bold(),
                finding.category,
                finding.principle,
                finding.message
            )?;
            if let Some(excerpt) = &finding.excerpt {
                writeln!(self.writer, "         {}", excerpt.dimmed())?;
            }
        }

        let summary = report.summary();
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{} finding(s): {} critical, {} error, {} warning, {} info",
            summary.total.to_string().bold(),
            summary.critical,
            summary.error,
            summary.warning,
            summary.info
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Category;
    use crate::report::ReportBuilder;
    use std::path::Path;

    fn report() -> Report {
        let mut builder = ReportBuilder::new();
        builder.push_literal(
            Finding::new(
                Category::Literal,
                "SECURITY",
                Severity::Critical,
                Path::new("lib/a.rb"),
                "Hardcoded credential",
            )
            .at_line(3),
        );
        builder.push_conceptual(Finding::new(
            Category::Conceptual,
            "SRP",
            Severity::Warning,
            Path::new("lib/a.rb"),
            "two | reasons",
        ));
        builder.build()
    }

    fn render(format: OutputFormat, report: &Report) -> String {
        let mut out = Vec::new();
        create_writer(format, &mut out).write_report(report).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn markdown_has_summary_and_both_sections() {
        let text = render(OutputFormat::Markdown, &report());
        assert!(text.starts_with("# Enforcer Report"));
        assert!(text.contains("| critical | 1 |"));
        assert!(text.contains("## Deterministic (1 findings)"));
        assert!(text.contains("## Conceptual (1 findings)"));
        assert!(text.contains("| `lib/a.rb:3` | critical | literal | SECURITY |"));
        assert!(text.contains("two \\| reasons"));
    }

    #[test]
    fn json_round_trips() {
        let original = report();
        let text = render(OutputFormat::Json, &original);
        let parsed: Report = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn terminal_lists_highest_severity_first() {
        colored::control::set_override(false);
        let text = render(OutputFormat::Terminal, &report());
        let first = text.lines().next().unwrap();
        assert!(first.starts_with("CRITICAL"));
        assert!(text.contains("2 finding(s): 1 critical, 0 error, 1 warning, 0 info"));

        let empty = render(OutputFormat::Terminal, &Report::default());
        assert_eq!(empty.trim(), "No findings.");
    }
}

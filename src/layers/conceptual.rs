use super::Layer;
use crate::analyzers::{code_lines, loop_bodies, strip_strings_and_comments};
use crate::core::{Category, Finding, Severity};
use crate::patterns::structural::{INLINE_LOOP, IO_OPERATION, MIN_SEQUENTIAL_SAVES, SAVE_CALL};
use crate::patterns::RuleSet;
use std::collections::BTreeSet;
use std::path::Path;

/// Structural heuristics: I/O inside loops and runs of single-record saves.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConceptualLayer;

impl Layer for ConceptualLayer {
    fn category(&self) -> Category {
        Category::Conceptual
    }

    fn check(&self, source: &str, _rules: &RuleSet, file: &Path) -> Vec<Finding> {
        let mut findings = io_in_loops(source, file);
        findings.extend(sequential_saves(source, file));
        findings
    }
}

fn io_in_loops(source: &str, file: &Path) -> Vec<Finding> {
    let mut reported: BTreeSet<usize> = BTreeSet::new();
    let mut findings = Vec::new();

    for body in loop_bodies(source) {
        for (line_no, text) in &body.lines {
            let code = strip_strings_and_comments(text);
            if IO_OPERATION.is_match(&code) && reported.insert(*line_no) {
                findings.push(io_finding(file, *line_no, body.start_line, text));
            }
        }
    }

    for (line_no, line) in code_lines(source) {
        let code = strip_strings_and_comments(line);
        let Some(loop_start) = INLINE_LOOP.find(&code) else {
            continue;
        };
        if IO_OPERATION.is_match(&code[loop_start.end()..]) && reported.insert(line_no) {
            findings.push(io_finding(file, line_no, line_no, line));
        }
    }

    findings.sort_by_key(|f| f.line);
    findings
}

fn io_finding(file: &Path, line: usize, loop_line: usize, text: &str) -> Finding {
    Finding::new(
        Category::Conceptual,
        "PERFORMANCE",
        Severity::Warning,
        file,
        format!("I/O operation inside loop (loop starts at line {loop_line}); batch or hoist it"),
    )
    .at_line(line)
    .with_excerpt(text)
}

fn sequential_saves(source: &str, file: &Path) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut run: Vec<usize> = Vec::new();

    let mut flush = |run: &mut Vec<usize>| {
        if run.len() >= MIN_SEQUENTIAL_SAVES {
            findings.push(
                Finding::new(
                    Category::Conceptual,
                    "PERFORMANCE",
                    Severity::Info,
                    file,
                    format!(
                        "{} sequential save calls; consider a bulk operation",
                        run.len()
                    ),
                )
                .at_line(run[0]),
            );
        }
        run.clear();
    };

    for (line_no, line) in code_lines(source) {
        if SAVE_CALL.is_match(&strip_strings_and_comments(line)) {
            run.push(line_no);
        } else {
            flush(&mut run);
        }
    }
    flush(&mut run);

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn check(source: &str) -> Vec<Finding> {
        ConceptualLayer.check(source, &RuleSet::builtin(), Path::new("a.rb"))
    }

    #[test]
    fn io_in_block_loop_is_reported_once_even_when_nested() {
        let source = indoc! {"
            users.each do |user|
              user.orders.each do |order|
                order.save
              end
            end
        "};
        let findings = check(source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(3));
        assert!(findings[0].message.contains("line 1"));
    }

    #[test]
    fn inline_loop_with_io() {
        let findings = check("ids.each { |id| Order.find_by(id: id) }\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(1));
    }

    #[test]
    fn io_outside_loop_passes() {
        assert!(check("data = File.read(path)\nputs data\n").is_empty());
    }

    #[test]
    fn three_sequential_saves() {
        let source = indoc! {"
            a.save
            b.save!
            # keep going
            c.update(name: n)
            log(done)
            d.save
        "};
        let findings = check(source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(1));
        assert!(findings[0].message.starts_with("3 sequential"));
    }
}

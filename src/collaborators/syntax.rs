use super::{SyntaxChecker, SyntaxIssue};
use crate::analyzers::{classify_line, strip_strings_and_comments, LineKind};
use std::path::Path;

/// Heuristic syntax check: `def`/`end` blocks and brackets must balance.
///
/// Catches the common breakages (missing or stray `end`, unclosed bracket)
/// without a real parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockBalanceChecker;

impl SyntaxChecker for BlockBalanceChecker {
    fn check(&self, _file: &Path, source: &str) -> Result<(), SyntaxIssue> {
        check_blocks(source)?;
        check_brackets(source)
    }
}

fn check_blocks(source: &str) -> Result<(), SyntaxIssue> {
    let mut open_lines: Vec<usize> = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        match classify_line(line) {
            LineKind::Opener => open_lines.push(idx + 1),
            LineKind::Closer => {
                if open_lines.pop().is_none() {
                    return Err(SyntaxIssue {
                        line: Some(idx + 1),
                        message: "unexpected 'end'".to_string(),
                    });
                }
            }
            LineKind::Neutral => {}
        }
    }

    match open_lines.last() {
        Some(line) => Err(SyntaxIssue {
            line: Some(*line),
            message: "block opened here is missing its 'end'".to_string(),
        }),
        None => Ok(()),
    }
}

fn check_brackets(source: &str) -> Result<(), SyntaxIssue> {
    let mut stack: Vec<(char, usize)> = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        for c in strip_strings_and_comments(line).chars() {
            match c {
                '(' | '[' | '{' => stack.push((c, line_no)),
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == expected => {}
                        _ => {
                            return Err(SyntaxIssue {
                                line: Some(line_no),
                                message: format!("unbalanced '{c}'"),
                            })
                        }
                    }
                }
                _ => {}
            }
        }
    }

    match stack.last() {
        Some((open, line)) => Err(SyntaxIssue {
            line: Some(*line),
            message: format!("unclosed '{open}'"),
        }),
        None => Ok(()),
    }
}

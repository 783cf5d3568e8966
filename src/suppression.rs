//! Inline suppression comments.
//!
//! ```text
//! x = eval(code) # enforcer:disable-line[literal] -- sandboxed
//! # enforcer:disable-next-line
//! # enforcer:disable-start[lexical,unit]
//! # enforcer:disable-end
//! ```
//!
//! A category list restricts the suppression; without one every category is
//! suppressed. Blocks left open at end of file suppress nothing and are
//! reported through [`SuppressionContext::unclosed_blocks`].

use crate::core::{Category, Finding};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static BLOCK_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*#\s*enforcer:disable-start(?:\s*\[([\w,\s*]+)\])?(?:\s*--\s*(.*))?$").unwrap()
});
static BLOCK_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#\s*enforcer:disable-end\s*$").unwrap());
static NEXT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*#\s*enforcer:disable-next-line(?:\s*\[([\w,\s*]+)\])?(?:\s*--\s*(.*))?$")
        .unwrap()
});
static SAME_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"#\s*enforcer:disable-line(?:\s*\[([\w,\s*]+)\])?(?:\s*--\s*(.*))?$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionBlock {
    pub start_line: usize,
    pub end_line: usize,
    pub categories: Vec<Category>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionRule {
    pub categories: Vec<Category>,
    pub reason: Option<String>,
    pub applies_to_next_line: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SuppressionContext {
    blocks: Vec<SuppressionBlock>,
    line_rules: HashMap<usize, SuppressionRule>,
    unclosed_blocks: Vec<usize>,
}

impl SuppressionContext {
    pub fn is_suppressed(&self, line: Option<usize>, category: Category) -> bool {
        match line {
            Some(line) => {
                self.in_block(line, category)
                    || self.has_line_rule(line, category)
                    || self.has_next_line_rule(line, category)
            }
            // A finding without a line is covered only by a block opening the file.
            None => self
                .blocks
                .iter()
                .any(|b| b.start_line == 1 && category_matches(category, &b.categories)),
        }
    }

    pub fn suppresses(&self, finding: &Finding) -> bool {
        self.is_suppressed(finding.line, finding.category)
    }

    /// Start lines of `disable-start` comments that never saw a `disable-end`
    pub fn unclosed_blocks(&self) -> &[usize] {
        &self.unclosed_blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.line_rules.is_empty()
    }

    fn in_block(&self, line: usize, category: Category) -> bool {
        self.blocks
            .iter()
            .filter(|b| line >= b.start_line && line <= b.end_line)
            .any(|b| category_matches(category, &b.categories))
    }

    fn has_line_rule(&self, line: usize, category: Category) -> bool {
        self.line_rules
            .get(&line)
            .is_some_and(|rule| !rule.applies_to_next_line && category_matches(category, &rule.categories))
    }

    fn has_next_line_rule(&self, line: usize, category: Category) -> bool {
        (line > 1)
            .then(|| self.line_rules.get(&(line - 1)))
            .flatten()
            .is_some_and(|rule| {
                rule.applies_to_next_line && category_matches(category, &rule.categories)
            })
    }
}

fn category_matches(category: Category, allowed: &[Category]) -> bool {
    allowed.is_empty() || allowed.contains(&category)
}

/// Parse `[lexical, line]`. `*` or an absent list means every category;
/// unknown names are logged and ignored.
fn parse_categories(list: Option<&str>) -> Vec<Category> {
    let Some(list) = list else {
        return Vec::new();
    };
    let names: Vec<&str> = list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    if names.contains(&"*") {
        return Vec::new();
    }
    names
        .into_iter()
        .filter_map(|name| {
            let parsed = Category::parse(name);
            if parsed.is_none() {
                log::warn!("Unknown category '{name}' in suppression comment");
            }
            parsed
        })
        .collect()
}

fn captured(caps: &regex::Captures<'_>) -> (Vec<Category>, Option<String>) {
    (
        parse_categories(caps.get(1).map(|m| m.as_str())),
        caps.get(2).map(|m| m.as_str().trim().to_string()),
    )
}

pub fn parse_suppression_comments(content: &str) -> SuppressionContext {
    let mut context = SuppressionContext::default();
    let mut open_blocks: Vec<(usize, Vec<Category>, Option<String>)> = Vec::new();

    for (line_number, line) in content.lines().enumerate().map(|(idx, l)| (idx + 1, l)) {
        if let Some(caps) = BLOCK_START.captures(line) {
            let (categories, reason) = captured(&caps);
            open_blocks.push((line_number, categories, reason));
        } else if BLOCK_END.is_match(line) {
            if let Some((start_line, categories, reason)) = open_blocks.pop() {
                context.blocks.push(SuppressionBlock {
                    start_line,
                    end_line: line_number,
                    categories,
                    reason,
                });
            }
        } else if let Some(caps) = NEXT_LINE.captures(line) {
            let (categories, reason) = captured(&caps);
            context.line_rules.insert(
                line_number,
                SuppressionRule {
                    categories,
                    reason,
                    applies_to_next_line: true,
                },
            );
        } else if let Some(caps) = SAME_LINE.captures(line) {
            let (categories, reason) = captured(&caps);
            context.line_rules.insert(
                line_number,
                SuppressionRule {
                    categories,
                    reason,
                    applies_to_next_line: false,
                },
            );
        }
    }

    context.unclosed_blocks = open_blocks.into_iter().map(|(start, _, _)| start).collect();
    if !context.unclosed_blocks.is_empty() {
        log::warn!(
            "Unclosed enforcer:disable-start block(s) at line(s) {:?}",
            context.unclosed_blocks
        );
    }
    context
}

//! Text-level primitives shared by the layers, scopes and smell detector.
//!
//! Every function here is total: malformed or unbalanced input produces
//! empty or zero results, never a panic and never a negative count.

mod blocks;
mod identifiers;
mod strings;

pub use blocks::{
    classify_line, count_params, loop_bodies, method_lengths, method_name, nesting_depth,
    LineKind, LoopBody, MethodSpan,
};
pub use identifiers::{
    case_variant_groups, identifier_counts, identifiers, levenshtein, likely_typos,
    RESERVED_WORDS,
};
pub use strings::{repeated_strings, strip_comment, strip_strings_and_comments, RepeatedString};

/// Lines that carry code: comment-only and blank lines are left out.
pub fn code_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().filter_map(|(idx, line)| {
        let trimmed = line.trim_start();
        (!trimmed.is_empty() && !trimmed.starts_with('#')).then_some((idx + 1, line))
    })
}

/// 1-based line number of a byte offset into `text`.
pub fn line_of_offset(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

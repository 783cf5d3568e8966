use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

use super::strings::strip_strings_and_comments;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*[?!]?").unwrap());

/// Keywords and ubiquitous core calls that never count as user identifiers.
pub const RESERVED_WORDS: &[&str] = &[
    "BEGIN", "END", "alias", "and", "attr_accessor", "attr_reader", "attr_writer", "begin",
    "break", "case", "class", "def", "defined?", "do", "else", "elsif", "end", "ensure", "extend",
    "false", "for", "if", "in", "include", "lambda", "loop", "module", "new", "next", "nil", "not",
    "or", "private", "proc", "protected", "public", "puts", "raise", "redo", "require",
    "require_relative", "rescue", "retry", "return", "self", "super", "then", "true", "undef",
    "unless", "until", "when", "while", "yield",
];

/// Identifiers with their occurrence counts, in first-seen order.
pub fn identifier_counts(text: &str) -> Vec<(String, usize)> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for (_, line) in super::code_lines(text) {
        let code = strip_strings_and_comments(line);
        for m in IDENTIFIER.find_iter(&code) {
            let token = m.as_str();
            if RESERVED_WORDS.contains(&token) {
                continue;
            }
            let count = counts.entry(token.to_string()).or_insert(0);
            if *count == 0 {
                order.push(token.to_string());
            }
            *count += 1;
        }
    }

    order
        .into_iter()
        .map(|name| {
            let count = counts.get(&name).copied().unwrap_or(0);
            (name, count)
        })
        .collect()
}

/// Unique identifiers in first-seen order, reserved words excluded.
pub fn identifiers(text: &str) -> Vec<String> {
    identifier_counts(text)
        .into_iter()
        .map(|(name, _)| name)
        .collect()
}

/// Edit distance between two identifiers, by characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

fn is_local_style(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
}

fn fold_case(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Groups of lowercase-initial identifiers that differ only by case or underscores
/// (`user_name` / `userName`). Each group holds at least two spellings.
pub fn case_variant_groups(identifiers: &[String]) -> Vec<Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in identifiers.iter().filter(|n| is_local_style(n)) {
        let spellings = groups.entry(fold_case(name)).or_default();
        if !spellings.contains(name) {
            spellings.push(name.clone());
        }
    }

    groups
        .into_values()
        .filter(|spellings| spellings.len() > 1)
        .collect()
}

const MIN_TYPO_LENGTH: usize = 5;

/// Pairs `(rare, common)` where `rare` appears once and sits one edit away from
/// a more frequent identifier: likely a misspelling.
pub fn likely_typos(text: &str) -> Vec<(String, String)> {
    let counts: Vec<(String, usize)> = identifier_counts(text)
        .into_iter()
        .filter(|(name, _)| is_local_style(name) && name.chars().count() >= MIN_TYPO_LENGTH)
        .collect();

    let mut pairs = Vec::new();
    for (rare, rare_count) in counts.iter().filter(|(_, count)| *count == 1) {
        let closest = counts.iter().find(|(common, common_count)| {
            *common_count > *rare_count
                && levenshtein(rare, common) == 1
                && !differs_only_by_suffix(rare, common)
        });
        if let Some((common, _)) = closest {
            pairs.push((rare.clone(), common.clone()));
        }
    }
    pairs
}

/// Plurals, predicates, bang methods and numbered variants are deliberate.
fn differs_only_by_suffix(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() < b.len() { (a, b) } else { (b, a) };
    match long.strip_prefix(short) {
        Some(rest) => matches!(rest, "s" | "?" | "!" | "=")
            || rest.chars().all(|c| c.is_ascii_digit()),
        None => {
            let trim = |s: &str| s.trim_end_matches(|c: char| c.is_ascii_digit()).to_string();
            trim(a) == trim(b)
        }
    }
}

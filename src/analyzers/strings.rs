use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)'"#).unwrap());

/// A quoted literal and how often it occurs verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatedString {
    pub value: String,
    pub count: usize,
}

/// Quoted literals of at least `min_length` characters occurring `min_count` or more times.
///
/// Ordered by count (descending), then value, so output is stable.
pub fn repeated_strings(text: &str, min_length: usize, min_count: usize) -> Vec<RepeatedString> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for (_, line) in super::code_lines(text) {
        for caps in STRING_LITERAL.captures_iter(line) {
            let value = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or("");
            if value.chars().count() >= min_length {
                *counts.entry(value).or_insert(0) += 1;
            }
        }
    }

    let mut repeated: Vec<RepeatedString> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_count)
        .map(|(value, count)| RepeatedString {
            value: value.to_string(),
            count,
        })
        .collect();

    repeated.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    repeated
}

/// `line` without its trailing comment. A `#` inside a string literal is kept.
pub fn strip_comment(line: &str) -> &str {
    let mut from = 0;
    for literal in STRING_LITERAL.find_iter(line) {
        if let Some(idx) = line[from..literal.start()].find('#') {
            return line[..from + idx].trim_end();
        }
        from = literal.end();
    }
    match line[from..].find('#') {
        Some(idx) => line[..from + idx].trim_end(),
        None => line,
    }
}

/// Blank out string literals and trailing comments so token scans see only code.
pub fn strip_strings_and_comments(line: &str) -> String {
    let without_strings = STRING_LITERAL.replace_all(line, "\"\"");
    match without_strings.find('#') {
        Some(idx) => without_strings[..idx].to_string(),
        None => without_strings.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_comment_keeps_hashes_inside_strings() {
        assert_eq!(strip_comment("MAX = 5 # enforcer:disable-line"), "MAX = 5");
        assert_eq!(strip_comment(r#"TAG = "a#b" # note"#), r#"TAG = "a#b""#);
        assert_eq!(strip_comment(r##"puts "#{name}""##), r##"puts "#{name}""##);
        assert_eq!(strip_comment("x = 1"), "x = 1");
    }

    #[test]
    fn counts_exact_repeats_above_thresholds() {
        let code = r#"
status = "pending"
if status == "pending" then notify('pending') end
label = "ok"
label = "ok"
# "pending" in a comment does not count
"#;
        let repeated = repeated_strings(code, 3, 2);
        assert_eq!(
            repeated,
            vec![RepeatedString {
                value: "pending".into(),
                count: 3
            }]
        );
    }

    #[test]
    fn escaped_quotes_stay_inside_literal() {
        let code = r#"a = "say \"hi\""
b = "say \"hi\"""#;
        let repeated = repeated_strings(code, 3, 2);
        assert_eq!(repeated.len(), 1);
        assert_eq!(repeated[0].value, r#"say \"hi\""#);
    }

    #[test]
    fn unterminated_quotes_are_ignored() {
        assert!(repeated_strings("x = \"open\ny = \"open\n", 1, 2).is_empty());
    }

    #[test]
    fn strips_literals_and_comments() {
        assert_eq!(
            strip_strings_and_comments(r#"name = "a # b" # trailing"#),
            r#"name = "" "#
        );
    }
}

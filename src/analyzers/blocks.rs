use super::strip_strings_and_comments;
use once_cell::sync::Lazy;
use regex::Regex;

/// Visibility prefix a `def` may carry on the same line (`private def helper`).
const DEF_PREFIX: &str = r"^\s*(?:(?:private|protected|public|private_class_method|module_function)\s+)?def\s+";

static BLOCK_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^\s*(?:if|unless|while|until|for|case|begin|class|module)\b|{DEF_PREFIX}"
    ))
    .unwrap()
});
static ASSIGNED_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[\w@.\[\]]+\s*(?:\|\|=|=)\s*(?:if|unless|case|begin)\b").unwrap()
});
static DO_OPENER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bdo\s*(?:\|[^|]*\|)?\s*$").unwrap());
static BLOCK_CLOSER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*end\b").unwrap());
static TRAILING_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bend\s*$").unwrap());
static ENDLESS_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{DEF_PREFIX}[^\s(;]+\s*(?:\([^)]*\))?\s*=\s")).unwrap()
});
static METHOD_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"{DEF_PREFIX}((?:self\.)?[^\s(;]+)")).unwrap());
static PAREN_PARAMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{DEF_PREFIX}(?:self\.)?[^\s(;]+\s*\(([^)]*)\)")).unwrap()
});
static BARE_PARAMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{DEF_PREFIX}(?:self\.)?[^\s(;]+\s+([^=;#\s][^;#]*)$")).unwrap()
});
static LOOP_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:while|until|for|loop)\b|\.(?:each|each_with_index|each_with_object|map|flat_map|select|reject|times|upto|downto|step|find_each|each_slice)\b",
    )
    .unwrap()
});

/// How a line affects block nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Opener,
    Closer,
    Neutral,
}

/// Classify one line as opening a block, closing one, or neither.
///
/// Keywords inside string literals and comments are ignored. One-line blocks
/// (`def name; end`) and endless methods (`def name = value`) open and close
/// on the same line, so they are neutral.
pub fn classify_line(line: &str) -> LineKind {
    let code = strip_strings_and_comments(line);
    if code.trim().is_empty() {
        return LineKind::Neutral;
    }
    if BLOCK_CLOSER.is_match(&code) {
        return LineKind::Closer;
    }

    let opens = BLOCK_OPENER.is_match(&code)
        || ASSIGNED_OPENER.is_match(&code)
        || DO_OPENER.is_match(&code);
    if !opens || ENDLESS_DEF.is_match(&code) {
        return LineKind::Neutral;
    }
    if TRAILING_END.is_match(&code) {
        LineKind::Neutral
    } else {
        LineKind::Opener
    }
}

/// Deepest block nesting reached anywhere in `text`.
pub fn nesting_depth(text: &str) -> usize {
    let mut depth = 0usize;
    let mut max_depth = 0usize;

    for line in text.lines() {
        match classify_line(line) {
            LineKind::Opener => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            LineKind::Closer => depth = depth.saturating_sub(1),
            LineKind::Neutral => {}
        }
    }

    max_depth
}

/// A method definition and how many lines it spans, `def` and `end` included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpan {
    pub name: String,
    pub start_line: usize,
    pub length: usize,
}

/// Name of the method defined on `line`, if it is a `def` line.
///
/// Singleton methods keep their `self.` prefix so they never collide with
/// instance methods of the same name.
pub fn method_name(line: &str) -> Option<String> {
    METHOD_NAME
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Number of parameters declared on a `def` line (0 when none or not a def).
pub fn count_params(line: &str) -> usize {
    let params = PAREN_PARAMS
        .captures(line)
        .or_else(|| BARE_PARAMS.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or("");

    params.split(',').filter(|p| !p.trim().is_empty()).count()
}

/// Scan method spans with a stack of `(start_line, depth_at_entry, name)`.
///
/// A method completes on the closing line that returns nesting to the depth
/// at which it was opened, so inner defs and blocks close on their own level.
pub fn method_lengths(text: &str) -> Vec<MethodSpan> {
    let mut stack: Vec<(usize, usize, String)> = Vec::new();
    let mut spans = Vec::new();
    let mut depth = 0usize;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        match classify_line(line) {
            LineKind::Opener => {
                if let Some(name) = method_name(line) {
                    stack.push((line_no, depth, name));
                }
                depth += 1;
            }
            LineKind::Closer => {
                if depth == 0 {
                    continue;
                }
                depth -= 1;
                if stack.last().is_some_and(|(_, entry, _)| *entry == depth) {
                    if let Some((start_line, _, name)) = stack.pop() {
                        spans.push(MethodSpan {
                            name,
                            start_line,
                            length: line_no - start_line + 1,
                        });
                    }
                }
            }
            LineKind::Neutral => {
                if let Some(name) = method_name(line) {
                    spans.push(MethodSpan {
                        name,
                        start_line: line_no,
                        length: 1,
                    });
                }
            }
        }
    }

    spans.sort_by_key(|span| span.start_line);
    spans
}

/// Body of a multi-line loop or iterator block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopBody {
    pub start_line: usize,
    /// `(line number, text)` of every line between the opener and its `end`
    pub lines: Vec<(usize, String)>,
    entry_depth: usize,
}

/// Extract loop bodies by pairing loop openers with their closing `end`.
///
/// Lines of a nested loop belong to every enclosing loop as well. Loops left
/// open at end of input keep whatever lines were collected.
pub fn loop_bodies(text: &str) -> Vec<LoopBody> {
    let mut open: Vec<LoopBody> = Vec::new();
    let mut finished = Vec::new();
    let mut depth = 0usize;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let kind = classify_line(line);

        if kind == LineKind::Closer && depth > 0 {
            depth -= 1;
            while open.last().is_some_and(|body| body.entry_depth >= depth) {
                if let Some(body) = open.pop() {
                    finished.push(body);
                }
            }
            continue;
        }

        for body in open.iter_mut() {
            body.lines.push((line_no, line.to_string()));
        }

        if kind == LineKind::Opener {
            if LOOP_OPENER.is_match(line) {
                open.push(LoopBody {
                    start_line: line_no,
                    lines: Vec::new(),
                    entry_depth: depth,
                });
            }
            depth += 1;
        }
    }

    finished.extend(open);
    finished.sort_by_key(|body| body.start_line);
    finished
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_openers_closers_and_one_liners() {
        assert_eq!(classify_line("  def save"), LineKind::Opener);
        assert_eq!(classify_line("items.each do |item|"), LineKind::Opener);
        assert_eq!(classify_line("total = if ready"), LineKind::Opener);
        assert_eq!(classify_line("  end"), LineKind::Closer);
        assert_eq!(classify_line("def noop; end"), LineKind::Neutral);
        assert_eq!(classify_line("def full_name = \"#{first} #{last}\""), LineKind::Neutral);
        assert_eq!(classify_line("return if done"), LineKind::Neutral);
        assert_eq!(classify_line("# if commented"), LineKind::Neutral);
        assert_eq!(classify_line("ending = 3"), LineKind::Neutral);
        assert_eq!(classify_line("class_name = :user"), LineKind::Neutral);
    }

    #[test]
    fn keywords_in_comments_and_strings_do_not_open_blocks() {
        assert_eq!(classify_line("retry_count = 0 # nothing else to do"), LineKind::Neutral);
        assert_eq!(classify_line("label = \"what to do\""), LineKind::Neutral);
        assert_eq!(classify_line("note = 'end'"), LineKind::Neutral);
        assert_eq!(classify_line("items.each do |item| # loop"), LineKind::Opener);
        assert_eq!(classify_line("end # of class"), LineKind::Closer);
    }

    #[test]
    fn visibility_prefixed_defs_open_blocks() {
        assert_eq!(classify_line("  private def helper"), LineKind::Opener);
        assert_eq!(classify_line("module_function def call(x)"), LineKind::Opener);
        assert_eq!(classify_line("private def ready? = true"), LineKind::Neutral);
        assert_eq!(classify_line("private :helper"), LineKind::Neutral);
        assert_eq!(method_name("  protected def compare(other)"), Some("compare".into()));
        assert_eq!(count_params("private def build(a, b)"), 2);
    }

    #[test]
    fn trailing_comment_and_private_def_keep_spans() {
        let commented = indoc! {"
            def sync
              retry_count = 0 # nothing else to do
              run
            end
        "};
        assert_eq!(nesting_depth(commented), 1);
        assert_eq!(
            method_lengths(commented),
            vec![MethodSpan {
                name: "sync".into(),
                start_line: 1,
                length: 4
            }]
        );

        let private = indoc! {"
            class A
              private def helper
                1
              end
            end
        "};
        assert_eq!(nesting_depth(private), 2);
        assert_eq!(
            method_lengths(private),
            vec![MethodSpan {
                name: "helper".into(),
                start_line: 2,
                length: 3
            }]
        );
    }

    #[test]
    fn nesting_tracks_maximum() {
        let code = indoc! {"
            class Cart
              def total
                items.each do |item|
                  if item.taxable?
                    tax += item.tax
                  end
                end
              end
            end
        "};
        assert_eq!(nesting_depth(code), 4);
    }

    #[test]
    fn nesting_clamps_at_zero_on_unbalanced_input() {
        assert_eq!(nesting_depth("end\nend\nend\nif x\n"), 1);
        assert_eq!(nesting_depth(""), 0);
    }

    #[test]
    fn method_lengths_handle_nested_defs() {
        let code = indoc! {"
            class Report
              def build
                def helper
                  1
                end
                helper + 1
              end

              def self.render; end
            end
        "};
        let spans = method_lengths(code);
        assert_eq!(
            spans,
            vec![
                MethodSpan {
                    name: "build".into(),
                    start_line: 2,
                    length: 6
                },
                MethodSpan {
                    name: "helper".into(),
                    start_line: 3,
                    length: 3
                },
                MethodSpan {
                    name: "self.render".into(),
                    start_line: 9,
                    length: 1
                },
            ]
        );
    }

    #[test]
    fn method_blocks_do_not_close_methods_early() {
        let code = indoc! {"
            def sync
              users.each do |u|
                u.touch
              end
              log
            end
        "};
        let spans = method_lengths(code);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].length, 6);
    }

    #[test]
    fn unclosed_methods_are_not_reported() {
        assert!(method_lengths("def broken\n  x = 1\n").is_empty());
    }

    #[test]
    fn params_are_counted_with_or_without_parens() {
        assert_eq!(count_params("def create(name, email, role = :user)"), 3);
        assert_eq!(count_params("def self.build a, b"), 2);
        assert_eq!(count_params("def reset"), 0);
        assert_eq!(count_params("def value = 42"), 0);
        assert_eq!(count_params("puts 'hello'"), 0);
    }

    #[test]
    fn method_names_keep_singleton_prefix_and_operators() {
        assert_eq!(method_name("  def self.call(x)"), Some("self.call".into()));
        assert_eq!(method_name("def <=>(other)"), Some("<=>".into()));
        assert_eq!(method_name("def name=(value)"), Some("name=".into()));
        assert_eq!(method_name("definitely = 1"), None);
    }

    #[test]
    fn loop_bodies_exclude_opener_and_end() {
        let code = indoc! {"
            def import
              rows.each do |row|
                record = Record.new(row)
                record.save
              end
              done
            end
        "};
        let bodies = loop_bodies(code);
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].start_line, 2);
        let numbers: Vec<usize> = bodies[0].lines.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![3, 4]);
    }

    #[test]
    fn nested_loops_share_inner_lines() {
        let code = indoc! {"
            while running
              jobs.each do |job|
                job.run
              end
            end
        "};
        let bodies = loop_bodies(code);
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0].lines.len(), 2);
        assert_eq!(bodies[1].lines.len(), 1);
    }
}

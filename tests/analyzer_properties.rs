//! Property-based tests for the text primitives and the layer engine
//!
//! Arbitrary, often unbalanced, input must never panic, and every span the
//! analyzers report must stay inside the source.

use enforcer::analyzers::{
    loop_bodies, method_lengths, nesting_depth, repeated_strings, strip_strings_and_comments,
};
use enforcer::layers::LayerEngine;
use enforcer::patterns::RuleSet;
use proptest::prelude::*;
use std::path::Path;

/// Ruby-ish lines, heavy on block keywords so nesting gets exercised
fn ruby_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("def run(a, b)".to_string()),
        Just("class Widget".to_string()),
        Just("if ready?".to_string()),
        Just("items.each do |item|".to_string()),
        Just("end".to_string()),
        Just("end".to_string()),
        Just("  x = \"#{name} \\\" quoted\"".to_string()),
        Just("  # comment with do and end".to_string()),
        "[ -~]{0,40}",
    ]
}

fn ruby_source() -> impl Strategy<Value = String> {
    prop::collection::vec(ruby_line(), 0..40).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn prop_method_spans_stay_inside_the_source(source in ruby_source()) {
        let total = source.lines().count();
        for span in method_lengths(&source) {
            prop_assert!(span.start_line >= 1);
            prop_assert!(span.length >= 1);
            prop_assert!(span.start_line + span.length - 1 <= total);
        }
    }

    #[test]
    fn prop_nesting_never_exceeds_line_count(source in ruby_source()) {
        prop_assert!(nesting_depth(&source) <= source.lines().count());
    }

    #[test]
    fn prop_loop_bodies_reference_real_lines(source in ruby_source()) {
        let total = source.lines().count();
        for body in loop_bodies(&source) {
            prop_assert!(body.start_line >= 1 && body.start_line <= total);
            for (line_no, _) in &body.lines {
                prop_assert!(*line_no > body.start_line && *line_no <= total);
            }
        }
    }

    #[test]
    fn prop_stripping_never_grows_a_line(line in "[ -~]{0,80}") {
        prop_assert!(strip_strings_and_comments(&line).chars().count() <= line.chars().count());
    }

    #[test]
    fn prop_repeated_strings_respect_minimums(source in ruby_source(), min_count in 2usize..5) {
        for repeated in repeated_strings(&source, 3, min_count) {
            prop_assert!(repeated.count >= min_count);
            prop_assert!(repeated.value.chars().count() >= 3);
        }
    }

    #[test]
    fn prop_layer_findings_point_into_the_file(source in ruby_source()) {
        let total = source.lines().count();
        let findings = LayerEngine::default().check(&source, &RuleSet::builtin(), Path::new("a.rb"));
        for finding in findings {
            if let Some(line) = finding.line {
                prop_assert!(line >= 1 && line <= total.max(1));
            }
        }
    }
}

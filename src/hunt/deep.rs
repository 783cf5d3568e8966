//! Eight-phase deep analysis of a single file.
//!
//! Phases run in a fixed order and each one records what it produced. The
//! execution phase is a checklist of perspectives and the last two phases
//! only audit that record; nothing here runs the analysed code.

use crate::analyzers::{
    case_variant_groups, code_lines, identifiers, likely_typos, method_lengths,
    strip_strings_and_comments, RESERVED_WORDS,
};
use crate::patterns::semantic::LOCAL_ASSIGNMENT;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lexical,
    Execution,
    Assumptions,
    DataFlow,
    State,
    Patterns,
    Proof,
    Verification,
}

impl Phase {
    pub const ALL: [Phase; 8] = [
        Phase::Lexical,
        Phase::Execution,
        Phase::Assumptions,
        Phase::DataFlow,
        Phase::State,
        Phase::Patterns,
        Phase::Proof,
        Phase::Verification,
    ];

    /// Phases whose output the proof phase audits.
    pub const RECORDED: [Phase; 6] = [
        Phase::Lexical,
        Phase::Execution,
        Phase::Assumptions,
        Phase::DataFlow,
        Phase::State,
        Phase::Patterns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Lexical => "lexical",
            Phase::Execution => "execution",
            Phase::Assumptions => "assumptions",
            Phase::DataFlow => "data_flow",
            Phase::State => "state",
            Phase::Patterns => "patterns",
            Phase::Proof => "proof",
            Phase::Verification => "verification",
        }
    }
}

/// A fixed viewpoint from which the reader walks the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Perspective {
    pub name: &'static str,
    pub focus: &'static str,
}

pub const PERSPECTIVES: [Perspective; 5] = [
    Perspective {
        name: "happy_path",
        focus: "Inputs are valid and every call succeeds",
    },
    Perspective {
        name: "edge_cases",
        focus: "Empty, nil, zero and boundary inputs",
    },
    Perspective {
        name: "concurrency",
        focus: "Interleaved callers touching shared state",
    },
    Perspective {
        name: "failure_modes",
        focus: "I/O, persistence and network calls that raise or return false",
    },
    Perspective {
        name: "backward_tracing",
        focus: "Work back from each output to the inputs that produce it",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionKind {
    ResourceOpen,
    Persistence,
    NilDereference,
    BoundsAccess,
    NetworkTimeout,
}

impl AssumptionKind {
    pub fn description(&self) -> &'static str {
        match self {
            AssumptionKind::ResourceOpen => "resource opened without handling a missing or unreadable file",
            AssumptionKind::Persistence => "persistence call whose failure is ignored",
            AssumptionKind::NilDereference => "lookup result dereferenced without a nil check",
            AssumptionKind::BoundsAccess => "fixed index read without a size check",
            AssumptionKind::NetworkTimeout => "network call without a timeout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assumption {
    pub kind: AssumptionKind,
    pub line: usize,
    pub excerpt: String,
}

/// Where a local variable is assigned and read, by line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataFlowTrace {
    pub variable: String,
    pub assigned_at: Vec<usize>,
    pub used_at: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    Nil,
    Empty,
    Zero,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundaryMarker {
    pub kind: BoundaryKind,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// A match against the known-bug table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BugSignature {
    pub name: &'static str,
    pub confidence: Confidence,
    pub line: usize,
    pub fix: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub items: usize,
    /// The phase's section has its expected shape
    pub complete: bool,
    pub summary: String,
}

/// Completeness check over the phase records. A phase counts when it was
/// recorded and its section is well formed: every perspective walked, every
/// item anchored to a line of the file, every trace starting at an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proof {
    pub checked: usize,
    pub missing: Vec<Phase>,
    pub complete: bool,
}

impl Proof {
    pub fn check(records: &[PhaseRecord]) -> Self {
        let missing: Vec<Phase> = Phase::RECORDED
            .iter()
            .copied()
            .filter(|phase| {
                !records
                    .iter()
                    .any(|r| r.phase == *phase && r.complete)
            })
            .collect();
        Self {
            checked: Phase::RECORDED.len() - missing.len(),
            complete: missing.is_empty(),
            missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub verified: bool,
    pub notes: Vec<String>,
}

impl Verification {
    pub fn check(proof: &Proof, perspectives: usize) -> Self {
        let mut notes = vec![format!(
            "proof covers {} of {} phases",
            proof.checked,
            Phase::RECORDED.len()
        )];
        for phase in &proof.missing {
            notes.push(format!("phase '{}' is missing or incomplete", phase.as_str()));
        }
        notes.push(format!("{perspectives} execution perspectives enumerated"));
        Self {
            verified: proof.complete && perspectives == PERSPECTIVES.len(),
            notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepReport {
    pub file: PathBuf,
    pub lexical: Vec<String>,
    pub perspectives: Vec<Perspective>,
    pub assumptions: Vec<Assumption>,
    pub data_flow: Vec<DataFlowTrace>,
    pub boundaries: Vec<BoundaryMarker>,
    pub signatures: Vec<BugSignature>,
    pub phases: Vec<PhaseRecord>,
    pub proof: Proof,
    pub verification: Verification,
}

impl DeepReport {
    /// One line per recorded phase.
    pub fn summary(&self) -> String {
        self.phases
            .iter()
            .map(|r| format!("{}: {}", r.phase.as_str(), r.summary))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

struct AssumptionRule {
    kind: AssumptionKind,
    pattern: Regex,
    line_guard: Option<Regex>,
    file_guard: Option<Regex>,
}

static ASSUMPTION_RULES: Lazy<Vec<AssumptionRule>> = Lazy::new(|| {
    vec![
        AssumptionRule {
            kind: AssumptionKind::ResourceOpen,
            pattern: Regex::new(r"\b(?:File|IO)\.(?:open|read|readlines|foreach)\b").unwrap(),
            line_guard: Some(Regex::new(r"exists?\?").unwrap()),
            file_guard: None,
        },
        AssumptionRule {
            kind: AssumptionKind::Persistence,
            pattern: Regex::new(r"\.(?:save|update|destroy|create)\b(?:[^!?]|$)").unwrap(),
            line_guard: Some(Regex::new(r"\b(?:if|unless|or|and|return)\b|\|\|").unwrap()),
            file_guard: None,
        },
        AssumptionRule {
            kind: AssumptionKind::NilDereference,
            pattern: Regex::new(r"\.(?:find_by|first|last|detect|dig)\b(?:\([^)]*\))?\.[a-z_]")
                .unwrap(),
            line_guard: Some(Regex::new(r"&\.|\b(?:if|unless)\b").unwrap()),
            file_guard: None,
        },
        AssumptionRule {
            kind: AssumptionKind::BoundsAccess,
            pattern: Regex::new(r"[a-z_\])]\[-?\d+\]").unwrap(),
            line_guard: Some(
                Regex::new(r"\.(?:empty\?|any\?|size|length|fetch)\b|\b(?:if|unless)\b").unwrap(),
            ),
            file_guard: None,
        },
        AssumptionRule {
            kind: AssumptionKind::NetworkTimeout,
            pattern: Regex::new(r"\b(?:Net::HTTP|HTTParty|Faraday|RestClient)\b|\bURI\.open\b")
                .unwrap(),
            line_guard: None,
            file_guard: Some(Regex::new(r"(?i)timeout").unwrap()),
        },
    ]
});

static RESCUE_OR_ENSURE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:rescue|ensure)\b").unwrap());

static BOUNDARY_PATTERNS: Lazy<Vec<(BoundaryKind, Regex)>> = Lazy::new(|| {
    vec![
        (BoundaryKind::Nil, Regex::new(r"\bnil\b|\.nil\?").unwrap()),
        (
            BoundaryKind::Empty,
            Regex::new(r#"\.(?:empty|blank)\?|\[\s*\]|\{\s*\}|""|''"#).unwrap(),
        ),
        (
            BoundaryKind::Zero,
            Regex::new(r"(?:^|[^\w.])0(?:[^\w.]|$)").unwrap(),
        ),
        (
            BoundaryKind::Negative,
            Regex::new(r"(?:^|[\s(\[,=<>])-\d").unwrap(),
        ),
    ]
});

struct SignatureRule {
    name: &'static str,
    pattern: Regex,
    unless: Option<Regex>,
    confidence: Confidence,
    fix: &'static str,
}

static SIGNATURES: Lazy<Vec<SignatureRule>> = Lazy::new(|| {
    vec![
        SignatureRule {
            name: "resource_leak",
            pattern: Regex::new(r"\b(?:File|IO|Tempfile)\.(?:open|new)\b").unwrap(),
            unless: Some(Regex::new(r"\bdo\b|\{|\.close\b").unwrap()),
            confidence: Confidence::High,
            fix: "Use the block form so the handle is closed when the block exits",
        },
        SignatureRule {
            name: "off_by_one",
            pattern: Regex::new(
                r"\b0\s*\.\.\s*[\w.]+\.(?:length|size|count)\b|<=\s*[\w.]+\.(?:length|size|count)\b",
            )
            .unwrap(),
            unless: Some(Regex::new(r"-\s*1\b").unwrap()),
            confidence: Confidence::Medium,
            fix: "Use an exclusive range (...) or compare with < length",
        },
        SignatureRule {
            name: "null_deref",
            pattern: Regex::new(r"\.(?:find_by|first|last|detect)\b(?:\([^)]*\))?\.[a-z_]")
                .unwrap(),
            unless: None,
            confidence: Confidence::Medium,
            fix: "Use safe navigation (&.) or handle the nil result explicitly",
        },
        SignatureRule {
            name: "race_condition",
            pattern: Regex::new(r"(?:@@[a-z_]\w*|\$[a-z_]\w*)\s*(?:[-+*/]|\|\|)?=[^=]").unwrap(),
            unless: Some(Regex::new(r"synchronize|Mutex").unwrap()),
            confidence: Confidence::Low,
            fix: "Guard shared state with a Mutex or move it out of class-level variables",
        },
        SignatureRule {
            name: "injection",
            pattern: Regex::new(
                r#"\b(?:where|find_by_sql|execute|exec_query|system|exec|eval)\b\s*\(?\s*"[^"]*#\{|`[^`]*#\{"#,
            )
            .unwrap(),
            unless: None,
            confidence: Confidence::High,
            fix: "Pass values as bound parameters or argument lists instead of interpolating them",
        },
        SignatureRule {
            name: "hardcoded_secret",
            pattern: Regex::new(
                r#"(?i)\b(?:password|passwd|secret|api_key|apikey|token)\b\s*[:=]\s*["'][^"']{4,}["']"#,
            )
            .unwrap(),
            unless: Some(Regex::new(r"ENV").unwrap()),
            confidence: Confidence::High,
            fix: "Read the secret from the environment or a credentials store",
        },
    ]
});

/// Runs the eight phases in order over one file.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeepAnalyzer;

impl DeepAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, source: &str, file: &Path) -> DeepReport {
        let mut phases = Vec::with_capacity(Phase::RECORDED.len());
        let line_count = source.lines().count();
        let in_file = |line: usize| (1..=line_count).contains(&line);

        let lexical = lexical_issues(source);
        phases.push(record(
            Phase::Lexical,
            lexical.len(),
            "identifier inconsistencies",
            lexical.iter().all(|issue| !issue.is_empty()),
        ));

        let perspectives = PERSPECTIVES.to_vec();
        phases.push(record(
            Phase::Execution,
            perspectives.len(),
            "perspectives walked",
            perspectives == PERSPECTIVES,
        ));

        let assumptions = unchecked_assumptions(source);
        phases.push(record(
            Phase::Assumptions,
            assumptions.len(),
            "unchecked assumptions",
            assumptions.iter().all(|a| in_file(a.line)),
        ));

        let data_flow = data_flow_traces(source);
        phases.push(record(
            Phase::DataFlow,
            data_flow.len(),
            "variables traced",
            data_flow.iter().all(trace_is_anchored),
        ));

        let boundaries = boundary_markers(source);
        phases.push(record(
            Phase::State,
            boundaries.len(),
            "boundary-state markers",
            boundaries.iter().all(|b| in_file(b.line)),
        ));

        let signatures = bug_signatures(source);
        phases.push(record(
            Phase::Patterns,
            signatures.len(),
            "bug signatures matched",
            signatures.iter().all(|sig| in_file(sig.line)),
        ));

        let proof = Proof::check(&phases);
        let verification = Verification::check(&proof, perspectives.len());
        log::debug!(
            "Deep analysis of {}: {} assumption(s), {} signature(s), verified={}",
            file.display(),
            assumptions.len(),
            signatures.len(),
            verification.verified
        );

        DeepReport {
            file: file.to_path_buf(),
            lexical,
            perspectives,
            assumptions,
            data_flow,
            boundaries,
            signatures,
            phases,
            proof,
            verification,
        }
    }
}

fn record(phase: Phase, items: usize, what: &str, complete: bool) -> PhaseRecord {
    PhaseRecord {
        phase,
        items,
        complete,
        summary: format!("{items} {what}"),
    }
}

/// A trace starts at its first assignment and never reads before it.
fn trace_is_anchored(trace: &DataFlowTrace) -> bool {
    match (trace.assigned_at.first(), trace.used_at.first()) {
        (Some(assigned), Some(used)) => assigned < used,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

fn lexical_issues(source: &str) -> Vec<String> {
    let mut issues: Vec<String> = likely_typos(source)
        .into_iter()
        .map(|(rare, common)| format!("'{rare}' looks like a misspelling of '{common}'"))
        .collect();
    issues.extend(
        case_variant_groups(&identifiers(source))
            .into_iter()
            .map(|group| format!("inconsistent spellings: {}", group.join(", "))),
    );
    issues
}

/// Lines inside a method that has a `rescue` or `ensure` clause.
fn rescued_lines(source: &str) -> HashSet<usize> {
    let lines: Vec<&str> = source.lines().collect();
    let mut covered = HashSet::new();
    for span in method_lengths(source) {
        let range = span.start_line..span.start_line + span.length;
        let rescued = range.clone().any(|n| {
            lines
                .get(n.saturating_sub(1))
                .is_some_and(|line| RESCUE_OR_ENSURE.is_match(&strip_strings_and_comments(line)))
        });
        if rescued {
            covered.extend(range);
        }
    }
    covered
}

fn unchecked_assumptions(source: &str) -> Vec<Assumption> {
    let rescued = rescued_lines(source);
    let active: Vec<&AssumptionRule> = ASSUMPTION_RULES
        .iter()
        .filter(|rule| rule.file_guard.as_ref().map_or(true, |g| !g.is_match(source)))
        .collect();

    let mut found = Vec::new();
    for (line_no, line) in code_lines(source) {
        if rescued.contains(&line_no) || RESCUE_OR_ENSURE.is_match(line) {
            continue;
        }
        for rule in &active {
            let guarded = rule.line_guard.as_ref().is_some_and(|g| g.is_match(line));
            if rule.pattern.is_match(line) && !guarded {
                found.push(Assumption {
                    kind: rule.kind,
                    line: line_no,
                    excerpt: line.trim().to_string(),
                });
            }
        }
    }
    found
}

fn data_flow_traces(source: &str) -> Vec<DataFlowTrace> {
    let mut traces: Vec<DataFlowTrace> = Vec::new();
    for (line_no, line) in code_lines(source) {
        let assigned = LOCAL_ASSIGNMENT
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|name| !RESERVED_WORDS.contains(name));

        let tokens = identifiers(line);
        for trace in traces.iter_mut() {
            if assigned != Some(trace.variable.as_str()) && tokens.contains(&trace.variable) {
                trace.used_at.push(line_no);
            }
        }

        if let Some(name) = assigned {
            match traces.iter_mut().find(|t| t.variable == name) {
                Some(trace) => trace.assigned_at.push(line_no),
                None => traces.push(DataFlowTrace {
                    variable: name.to_string(),
                    assigned_at: vec![line_no],
                    used_at: Vec::new(),
                }),
            }
        }
    }
    traces
}

fn boundary_markers(source: &str) -> Vec<BoundaryMarker> {
    let mut markers = Vec::new();
    for (line_no, line) in code_lines(source) {
        let code = match line.find(" #") {
            Some(idx) if !line[..idx].contains('"') && !line[..idx].contains('\'') => &line[..idx],
            _ => line,
        };
        for (kind, pattern) in BOUNDARY_PATTERNS.iter() {
            if pattern.is_match(code) {
                markers.push(BoundaryMarker {
                    kind: *kind,
                    line: line_no,
                });
            }
        }
    }
    markers
}

fn bug_signatures(source: &str) -> Vec<BugSignature> {
    let mut found = Vec::new();
    for (line_no, line) in code_lines(source) {
        for rule in SIGNATURES.iter() {
            let excused = rule.unless.as_ref().is_some_and(|u| u.is_match(line));
            if rule.pattern.is_match(line) && !excused {
                found.push(BugSignature {
                    name: rule.name,
                    confidence: rule.confidence,
                    line: line_no,
                    fix: rule.fix,
                });
            }
        }
    }
    found
}

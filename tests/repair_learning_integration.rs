use enforcer::collaborators::{AutoAccept, Fixer, TestRunner};
use enforcer::core::{Category, Finding, Severity};
use enforcer::errors::Result;
use enforcer::learning::{ConfidenceTier, LearningStore};
use enforcer::patterns::RuleSet;
use enforcer::repair::{RepairLoop, RepairOptions, RepairOutcome};
use enforcer::report::{AnalyzeOptions, Aggregator};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SOURCE: &str = "$counter = 0\npassword = \"hunter2hunter2\"\nsleep 5\n";

struct StaticFixer;

impl Fixer for StaticFixer {
    fn fix(&self, _path: &Path) -> Result<String> {
        Ok("move literal to ENV".into())
    }
}

struct Suite(bool);

impl TestRunner for Suite {
    fn run_tests(&self) -> Result<bool> {
        Ok(self.0)
    }
}

fn finding(file: &str) -> Finding {
    Finding::new(
        Category::Literal,
        "SECURITY",
        Severity::Critical,
        Path::new(file),
        "Hardcoded credential; load it from the environment or a secrets store",
    )
    .at_line(2)
}

#[test]
fn dry_run_skips_every_finding_and_leaves_files_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.rb");
    fs::write(&path, SOURCE).unwrap();

    let report = Aggregator::new(RuleSet::builtin()).analyze(SOURCE, &path, &AnalyzeOptions::default());
    let findings: Vec<Finding> = report.prioritized().into_iter().cloned().collect();
    assert!(!findings.is_empty());

    let mut repair = RepairLoop::new(LearningStore::in_memory())
        .with_gate(Box::new(AutoAccept))
        .with_fixer(Box::new(StaticFixer));
    let outcome = repair.run(&findings, &RepairOptions::default());

    let n = findings.len();
    assert_eq!(
        outcome,
        RepairOutcome {
            repaired: 0,
            failed: 0,
            skipped: n,
            total: n
        }
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);
    assert!(repair.store().records().is_empty());
}

#[test]
fn outcomes_persist_and_drive_known_fixes() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join(".enforcer/learnings.jsonl");
    let apply = RepairOptions {
        dry_run: false,
        auto_confirm: true,
    };

    let mut repair = RepairLoop::new(LearningStore::open(&store_path).unwrap())
        .with_fixer(Box::new(StaticFixer))
        .with_test_runner(Box::new(Suite(true)));
    let outcome = repair.run(&[finding("a.rb"), finding("b.rb"), finding("c.rb")], &apply);
    assert_eq!(outcome.repaired, 3);

    let reopened = LearningStore::open(&store_path).unwrap();
    assert_eq!(reopened.records().len(), 3);
    assert!(reopened.known_fix(&finding("d.rb")));
    assert_eq!(reopened.tier_for(&finding("d.rb")), ConfidenceTier::Promote);
}

#[test]
fn known_fix_needs_three_records_and_a_high_success_rate() {
    let fix = "move literal to ENV";

    let mut two_successes = LearningStore::in_memory();
    for _ in 0..2 {
        two_successes.record(&finding("a.rb"), fix, true).unwrap();
    }
    assert!(!two_successes.known_fix(&finding("a.rb")));

    let mut three_of_three = LearningStore::in_memory();
    for _ in 0..3 {
        three_of_three.record(&finding("a.rb"), fix, true).unwrap();
    }
    assert!(three_of_three.known_fix(&finding("a.rb")));

    let mut one_of_three = LearningStore::in_memory();
    one_of_three.record(&finding("a.rb"), fix, true).unwrap();
    one_of_three.record(&finding("a.rb"), fix, false).unwrap();
    one_of_three.record(&finding("a.rb"), fix, false).unwrap();
    assert!(!one_of_three.known_fix(&finding("a.rb")));
}

#[test]
fn regressions_are_rolled_back_and_counted_as_failures() {
    let mut repair = RepairLoop::new(LearningStore::in_memory())
        .with_fixer(Box::new(StaticFixer))
        .with_test_runner(Box::new(Suite(false)));
    let outcome = repair.run(
        &[finding("a.rb")],
        &RepairOptions {
            dry_run: false,
            auto_confirm: true,
        },
    );

    assert_eq!(outcome.failed, 1);
    let stats = repair.store().category_stats();
    let security = stats.values().next().unwrap();
    assert_eq!((security.successes, security.failures), (0, 1));
}

//! Audit, confirm, fix, retest, roll back and learn, one finding at a time.
//!
//! A finding is never retried within a run. Rollback of a regressing fix
//! finishes before the next finding is touched.

use crate::collaborators::{ConfirmationGate, Fixer, NoRollback, RejectAll, Rollback, TestRunner};
use crate::core::Finding;
use crate::learning::{fingerprint, LearningStore};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairOptions {
    /// Preview only; nothing is fixed, tested or recorded
    pub dry_run: bool,
    /// Skip the confirmation gate
    pub auto_confirm: bool,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            auto_confirm: false,
        }
    }
}

/// Disjoint outcome counts for one run. `total` is every finding processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairOutcome {
    pub repaired: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl RepairOutcome {
    fn count(&mut self, step: &Step) {
        match step {
            Step::Repaired => self.repaired += 1,
            Step::Failed(_) => self.failed += 1,
            Step::Skipped(_) => self.skipped += 1,
        }
        self.total += 1;
    }
}

#[derive(Debug)]
enum Step {
    Repaired,
    Failed(&'static str),
    Skipped(&'static str),
}

/// How a fix was obtained: a description from the fixer, or the
/// fingerprint of a previously successful fix.
enum AppliedFix {
    Fixer(String),
    Known(String),
}

impl AppliedFix {
    fn fingerprint(&self) -> String {
        match self {
            AppliedFix::Fixer(description) => fingerprint(description),
            AppliedFix::Known(fp) => fp.clone(),
        }
    }
}

pub struct RepairLoop {
    gate: Box<dyn ConfirmationGate>,
    fixer: Option<Box<dyn Fixer>>,
    tests: Option<Box<dyn TestRunner>>,
    rollback: Box<dyn Rollback>,
    store: LearningStore,
}

impl RepairLoop {
    /// Loop that rejects every repair at the gate until another gate is set.
    pub fn new(store: LearningStore) -> Self {
        Self {
            gate: Box::new(RejectAll),
            fixer: None,
            tests: None,
            rollback: Box::new(NoRollback),
            store,
        }
    }

    pub fn with_gate(mut self, gate: Box<dyn ConfirmationGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_fixer(mut self, fixer: Box<dyn Fixer>) -> Self {
        self.fixer = Some(fixer);
        self
    }

    pub fn with_test_runner(mut self, runner: Box<dyn TestRunner>) -> Self {
        self.tests = Some(runner);
        self
    }

    pub fn with_rollback(mut self, rollback: Box<dyn Rollback>) -> Self {
        self.rollback = rollback;
        self
    }

    pub fn store(&self) -> &LearningStore {
        &self.store
    }

    pub fn into_store(self) -> LearningStore {
        self.store
    }

    pub fn run(&mut self, findings: &[Finding], options: &RepairOptions) -> RepairOutcome {
        let _span = tracing::info_span!(
            "repair",
            findings = findings.len(),
            dry_run = options.dry_run
        )
        .entered();

        let mut outcome = RepairOutcome::default();
        for finding in findings {
            let step = self.repair_one(finding, options);
            match &step {
                Step::Repaired => log::info!("Repaired {}", finding.location()),
                Step::Failed(reason) => log::info!("Failed {}: {}", finding.location(), reason),
                Step::Skipped(reason) => log::debug!("Skipped {}: {}", finding.location(), reason),
            }
            outcome.count(&step);
        }

        log::info!(
            "Repair run: {} repaired, {} failed, {} skipped of {}",
            outcome.repaired,
            outcome.failed,
            outcome.skipped,
            outcome.total
        );
        outcome
    }

    fn repair_one(&mut self, finding: &Finding, options: &RepairOptions) -> Step {
        if options.dry_run {
            log::info!(
                "[dry-run] would repair {} [{}/{}]: {}",
                finding.location(),
                finding.category,
                finding.principle,
                finding.message
            );
            return Step::Skipped("dry run");
        }

        if !options.auto_confirm && !self.confirmed(finding) {
            return Step::Skipped("rejected at confirmation");
        }

        let Some(fix) = self.attempt_fix(finding) else {
            return Step::Failed("no fix available");
        };

        if self.regressed(finding) {
            if let Err(e) = self.rollback.rollback(&finding.file) {
                log::error!("Rollback of {} failed: {}", finding.file.display(), e);
            }
            self.learn(finding, &fix, false);
            return Step::Failed("regression");
        }

        self.learn(finding, &fix, true);
        Step::Repaired
    }

    fn confirmed(&self, finding: &Finding) -> bool {
        let label = format!("{} [{}]", finding.location(), finding.principle);
        match self.gate.confirm(&label, &finding.message) {
            Ok(answer) => answer,
            Err(e) => {
                log::warn!("Confirmation failed for {}: {}", label, e);
                false
            }
        }
    }

    fn attempt_fix(&self, finding: &Finding) -> Option<AppliedFix> {
        if let Some(fixer) = &self.fixer {
            match fixer.fix(&finding.file) {
                Ok(description) => return Some(AppliedFix::Fixer(description)),
                Err(e) => log::warn!("Fixer failed on {}: {}", finding.file.display(), e),
            }
        }
        self.store.apply_known(finding).map(AppliedFix::Known)
    }

    /// Whether the self-tests fail after a fix. A run error counts as a
    /// regression; no runner at all counts as clean.
    fn regressed(&self, finding: &Finding) -> bool {
        let Some(tests) = &self.tests else {
            log::warn!(
                "No test runner configured; accepting fix to {} untested",
                finding.file.display()
            );
            return false;
        };
        match tests.run_tests() {
            Ok(passed) => !passed,
            Err(e) => {
                log::warn!("Test run failed after fixing {}: {}", finding.file.display(), e);
                true
            }
        }
    }

    fn learn(&mut self, finding: &Finding, fix: &AppliedFix, success: bool) {
        if let Err(e) = self
            .store
            .record_fingerprint(finding, fix.fingerprint(), success)
        {
            log::warn!("Could not record learning outcome: {e}");
        }
    }
}

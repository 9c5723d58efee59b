//! Orchestration for `litguard check`: decide whether generation may run.
//!
//! A check loads the persisted state, collects the locally modified files,
//! dry-runs every literate source, reconciles the three, and persists the new
//! state. It never writes generated files.

use std::io::Write;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::reconcile::reconcile;
use crate::core::types::{
    BuildState, Decision, DryRunResult, LiterateSource, ModifiedFileSet, Reconciliation,
};
use crate::io::dry_run::collect_dry_run;
use crate::io::generator::Generator;
use crate::io::git::DiffProvider;
use crate::io::state_store::StateStore;

/// Everything a check observed and decided.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    /// State persisted by the previous run.
    pub prior: BuildState,
    pub modified: ModifiedFileSet,
    pub dry_run: DryRunResult,
    pub reconciliation: Reconciliation,
}

impl CheckOutcome {
    pub fn decision(&self) -> &Decision {
        &self.reconciliation.decision
    }

    pub fn is_blocked(&self) -> bool {
        self.decision().is_blocked()
    }

    /// State written at the end of the check.
    pub fn new_state(&self) -> BuildState {
        self.decision().new_state()
    }
}

/// Run the guard once and persist its decision.
///
/// Progress lines for the operator go to `out`. A blocked decision is a normal
/// outcome, not an error.
pub fn run_check<D, G, S>(
    sources: &[LiterateSource],
    diff: &D,
    generator: &G,
    store: &S,
    out: &mut dyn Write,
) -> Result<CheckOutcome>
where
    D: DiffProvider + ?Sized,
    G: Generator + ?Sized,
    S: StateStore + ?Sized,
{
    let prior = store.load();
    debug!(prior = %prior, "prior state");

    let modified = diff.modified_files()?;
    let dry_run = collect_dry_run(generator, sources)?;

    let reconciliation = reconcile(
        &modified,
        &dry_run,
        sources.iter().map(|source| source.path.as_str()),
        prior,
    );
    let outcome = CheckOutcome {
        prior,
        modified,
        dry_run,
        reconciliation,
    };

    write_narrative(&outcome, out).context("write progress")?;

    let new_state = outcome.new_state();
    store.save(new_state).context("persist build state")?;
    info!(
        prior = %prior,
        new_state = %new_state,
        blocked = outcome.is_blocked(),
        conflicts = outcome.reconciliation.conflicts.len(),
        "check finished"
    );
    Ok(outcome)
}

fn write_narrative(outcome: &CheckOutcome, out: &mut dyn Write) -> std::io::Result<()> {
    for path in &outcome.reconciliation.touched_sources {
        writeln!(out, "found {path}")?;
    }
    match outcome.decision() {
        Decision::Blocked { conflicting_paths } => {
            writeln!(
                out,
                "could not build because some changes would be overwritten"
            )?;
            for path in conflicting_paths {
                writeln!(out, "  {path}")?;
            }
        }
        Decision::Proceed {
            new_state: BuildState::Sync,
        } => writeln!(out, "everything is in sync")?,
        Decision::Proceed { .. } => {
            let files: Vec<&str> = outcome.dry_run.keys().map(String::as_str).collect();
            writeln!(out, "changing files: {}", files.join(", "))?;
        }
    }
    Ok(())
}

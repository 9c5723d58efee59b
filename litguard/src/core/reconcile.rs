//! Decide whether generation may overwrite the working tree.
//!
//! The reconciler combines what was edited locally, what the generator would
//! write, and the persisted history into a single [`Decision`]. It performs no
//! I/O; callers load and persist the state around it.

use std::collections::BTreeSet;

use crate::core::types::{BuildState, Decision, DryRunResult, ModifiedFileSet, Reconciliation};

/// Reconcile local modifications against a dry run.
///
/// Rules, in order:
/// - Conflicts with prior state `literate source changes` proceed and keep that state.
/// - Any other conflict blocks.
/// - Without conflicts, edits to literate sources mark `literate source changes`;
///   everything else is `sync`.
pub fn reconcile<'a, I>(
    modified: &ModifiedFileSet,
    dry_run: &DryRunResult,
    literate_paths: I,
    prior: BuildState,
) -> Reconciliation
where
    I: IntoIterator<Item = &'a str>,
{
    let literate_paths: BTreeSet<&str> = literate_paths.into_iter().collect();

    let conflicts: BTreeSet<String> = modified
        .iter()
        .filter(|path| dry_run.contains_key(path.as_str()))
        .cloned()
        .collect();
    let touched_sources: BTreeSet<String> = modified
        .iter()
        .filter(|path| literate_paths.contains(path.as_str()))
        .cloned()
        .collect();

    let decision = if !conflicts.is_empty() {
        if prior == BuildState::LiterateSourceChanges {
            Decision::Proceed {
                new_state: BuildState::LiterateSourceChanges,
            }
        } else {
            Decision::Blocked {
                conflicting_paths: conflicts.clone(),
            }
        }
    } else if modified.is_empty() || touched_sources.is_empty() {
        Decision::Proceed {
            new_state: BuildState::Sync,
        }
    } else {
        Decision::Proceed {
            new_state: BuildState::LiterateSourceChanges,
        }
    };

    Reconciliation {
        decision,
        conflicts,
        touched_sources,
    }
}

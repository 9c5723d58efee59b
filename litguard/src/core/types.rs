//! Shared deterministic types for the guard's core logic.
//!
//! These types define stable contracts between core components. They should not
//! depend on external state or I/O and must remain deterministic across runs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Repository-relative paths with uncommitted modifications.
pub type ModifiedFileSet = BTreeSet<String>;

/// Files the generator would write, keyed by repository-relative path.
///
/// Values are the generator's own bookkeeping and are never inspected.
pub type DryRunResult = BTreeMap<String, Value>;

/// Persisted record of the last known kind of change.
///
/// Defaults to `ManualCodeChanges`: unknown history is assumed unsafe to overwrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BuildState {
    /// Generated files match their literate sources.
    Sync,
    /// Literate sources were edited and their output regenerated.
    LiterateSourceChanges,
    /// Generated files were edited by hand.
    #[default]
    ManualCodeChanges,
}

impl BuildState {
    pub const ALL: [BuildState; 3] = [
        BuildState::Sync,
        BuildState::LiterateSourceChanges,
        BuildState::ManualCodeChanges,
    ];

    /// Literal token stored in the state file.
    pub fn as_token(self) -> &'static str {
        match self {
            BuildState::Sync => "sync",
            BuildState::LiterateSourceChanges => "literate source changes",
            BuildState::ManualCodeChanges => "manual code changes",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Error for a token that is not one of the three state literals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown build state '{0}'")]
pub struct UnknownBuildState(pub String);

impl FromStr for BuildState {
    type Err = UnknownBuildState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        BuildState::ALL
            .into_iter()
            .find(|state| state.as_token() == token)
            .ok_or_else(|| UnknownBuildState(token.to_string()))
    }
}

/// A configured literate document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiterateSource {
    /// Repository-relative path of the document.
    pub path: String,
    /// Working directory the generator runs in, relative to the repository root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,
    /// Output artifact passed to the generator during real generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Whether the real generation step runs this source.
    #[serde(default = "default_generate")]
    pub generate: bool,
}

fn default_generate() -> bool {
    true
}

impl LiterateSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            workdir: None,
            output: None,
            generate: true,
        }
    }

    pub fn in_workdir(mut self, workdir: impl Into<String>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn dry_run_only(mut self) -> Self {
        self.generate = false;
        self
    }
}

/// Outcome of reconciling local edits with what generation would touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Generation may run; persist `new_state` first.
    Proceed { new_state: BuildState },
    /// Generation would destroy manual edits to these paths.
    Blocked { conflicting_paths: BTreeSet<String> },
}

impl Decision {
    /// State to persist for this decision.
    pub fn new_state(&self) -> BuildState {
        match self {
            Decision::Proceed { new_state } => *new_state,
            Decision::Blocked { .. } => BuildState::ManualCodeChanges,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Decision::Blocked { .. })
    }
}

/// Full reconciler output: the decision plus the derived sets behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub decision: Decision,
    /// Modified paths the generator would overwrite.
    pub conflicts: BTreeSet<String>,
    /// Modified paths that are literate sources themselves.
    pub touched_sources: BTreeSet<String>,
}

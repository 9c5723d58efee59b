//! Git adapter for the change-set collector.
//!
//! The guard only needs two answers from version control: where the
//! repository root is, and which files have uncommitted modifications. Both
//! come from small, explicit `git` subprocess calls.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::changes::parse_name_only;
use crate::core::types::ModifiedFileSet;
use crate::io::process::{DEFAULT_TIMEOUT, Invocation, run};

/// Source of the set of files with uncommitted modifications.
pub trait DiffProvider {
    fn modified_files(&self) -> Result<ModifiedFileSet>;
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    /// Custom listing command. Empty means the built-in `git diff` listing.
    diff_command: Vec<String>,
    timeout: Duration,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            diff_command: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the built-in listing with `argv`. An empty `argv` keeps the built-in one.
    pub fn with_diff_command(mut self, argv: Vec<String>) -> Self {
        self.diff_command = argv;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return the top-level directory of the repository containing the workdir.
    #[instrument(skip_all)]
    pub fn toplevel(&self) -> Result<PathBuf> {
        let output = run(&self.git(&["rev-parse", "--show-toplevel"]).quiet())?
            .ensure_success()
            .context("locate repository root")?;
        let root = PathBuf::from(output.stdout_text().trim());
        debug!(root = %root.display(), "repository root");
        Ok(root)
    }

    /// Staged and unstaged changes against `HEAD`, NUL-separated so paths are not quoted.
    ///
    /// Before the first commit there is no `HEAD`; the index and the worktree
    /// listings are combined instead.
    fn uncommitted_files(&self) -> Result<ModifiedFileSet> {
        if self.has_head()? {
            return self.name_only(&["diff", "HEAD", "--name-only", "-z"]);
        }
        debug!("no commits yet, listing index and worktree changes");
        let mut files = self.name_only(&["diff", "--cached", "--name-only", "-z"])?;
        files.extend(self.name_only(&["diff", "--name-only", "-z"])?);
        Ok(files)
    }

    fn has_head(&self) -> Result<bool> {
        let output = run(&self.git(&["rev-parse", "--verify", "--quiet", "HEAD"]).quiet())?;
        Ok(output.success())
    }

    fn name_only(&self, args: &[&str]) -> Result<ModifiedFileSet> {
        let output = run(&self.git(args))?
            .ensure_success()
            .context("list modified files")?;
        Ok(parse_name_only(&output.stdout_text()))
    }

    fn git(&self, args: &[&str]) -> Invocation {
        Invocation::new(std::iter::once("git").chain(args.iter().copied()))
            .current_dir(&self.workdir)
            .timeout(self.timeout)
    }
}

impl DiffProvider for Git {
    /// Collect the modified files once, relative to the repository root.
    ///
    /// A failing listing is fatal: an incomplete set would hide conflicts.
    #[instrument(skip_all)]
    fn modified_files(&self) -> Result<ModifiedFileSet> {
        let files = if self.diff_command.is_empty() {
            self.uncommitted_files()?
        } else {
            let output = run(&Invocation::new(self.diff_command.iter().cloned())
                .current_dir(&self.workdir)
                .timeout(self.timeout))?
            .ensure_success()
            .context("list modified files")?;
            parse_name_only(&output.stdout_text())
        };
        debug!(count = files.len(), "modified files collected");
        Ok(files)
    }
}

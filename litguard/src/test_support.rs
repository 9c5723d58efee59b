//! Test-only fakes for the guard's collaborators and a scratch git repository.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tempfile::TempDir;

use crate::core::types::{BuildState, DryRunResult, LiterateSource, ModifiedFileSet};
use crate::io::generator::Generator;
use crate::io::git::DiffProvider;
use crate::io::process::{Invocation, ProcessReport, run};
use crate::io::state_store::StateStore;
use crate::io::test_runner::TestRunner;

/// Generator returning scripted dry-run maps and generation exit codes.
///
/// Sources without a scripted dry run fail, like a generator given a missing file.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    dry_runs: HashMap<String, DryRunResult>,
    generation_codes: HashMap<String, i32>,
    dry_run_calls: RefCell<Vec<String>>,
    generate_calls: RefCell<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a dry run reporting `files` (relative to the source's workdir).
    pub fn with_dry_run(mut self, source: &str, files: &[&str]) -> Self {
        let entry = self.dry_runs.entry(source.to_string()).or_default();
        for file in files {
            entry.insert(file.to_string(), Value::String(format!("{file} contents")));
        }
        self
    }

    pub fn with_dry_run_value(mut self, source: &str, file: &str, value: Value) -> Self {
        self.dry_runs
            .entry(source.to_string())
            .or_default()
            .insert(file.to_string(), value);
        self
    }

    /// Make real generation of `source` exit with `code`.
    pub fn failing_generation(mut self, source: &str, code: i32) -> Self {
        self.generation_codes.insert(source.to_string(), code);
        self
    }

    pub fn dry_run_calls(&self) -> Vec<String> {
        self.dry_run_calls.borrow().clone()
    }

    pub fn generate_calls(&self) -> Vec<String> {
        self.generate_calls.borrow().clone()
    }
}

impl Generator for ScriptedGenerator {
    fn dry_run(&self, source: &LiterateSource) -> Result<DryRunResult> {
        self.dry_run_calls.borrow_mut().push(source.path.clone());
        self.dry_runs
            .get(&source.path)
            .cloned()
            .ok_or_else(|| anyhow!("no scripted dry run for {}", source.path))
    }

    fn generate(&self, source: &LiterateSource) -> Result<ProcessReport> {
        self.generate_calls.borrow_mut().push(source.path.clone());
        let code = self.generation_codes.get(&source.path).copied().unwrap_or(0);
        Ok(ProcessReport {
            command: format!("lisi {}", source.path),
            code: Some(code),
            success: code == 0,
            stdout: String::new(),
        })
    }
}

/// Diff provider returning a fixed listing, or a fixed failure.
#[derive(Debug, Clone)]
pub struct StaticDiffProvider {
    result: Result<ModifiedFileSet, String>,
}

impl StaticDiffProvider {
    pub fn new(paths: &[&str]) -> Self {
        Self {
            result: Ok(paths.iter().map(|path| path.to_string()).collect()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
        }
    }
}

impl DiffProvider for StaticDiffProvider {
    fn modified_files(&self) -> Result<ModifiedFileSet> {
        self.result.clone().map_err(|message| anyhow!(message))
    }
}

/// In-memory state store recording every save.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: RefCell<Option<BuildState>>,
    history: RefCell<Vec<BuildState>>,
}

impl MemoryStateStore {
    /// Store with nothing persisted yet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_state(state: BuildState) -> Self {
        Self {
            state: RefCell::new(Some(state)),
            history: RefCell::new(Vec::new()),
        }
    }

    pub fn current(&self) -> Option<BuildState> {
        *self.state.borrow()
    }

    /// States saved so far, oldest first.
    pub fn history(&self) -> Vec<BuildState> {
        self.history.borrow().clone()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> BuildState {
        self.state.borrow().unwrap_or_default()
    }

    fn save(&self, state: BuildState) -> Result<()> {
        *self.state.borrow_mut() = Some(state);
        self.history.borrow_mut().push(state);
        Ok(())
    }
}

/// Test runner returning a fixed report and counting invocations.
#[derive(Debug)]
pub struct RecordingTestRunner {
    report: Option<ProcessReport>,
    calls: RefCell<usize>,
}

impl RecordingTestRunner {
    pub fn passing(stdout: &str) -> Self {
        Self::with_report(Some(test_report(stdout, 0)))
    }

    pub fn failing(stdout: &str, code: i32) -> Self {
        Self::with_report(Some(test_report(stdout, code)))
    }

    /// Behaves like an empty test command.
    pub fn disabled() -> Self {
        Self::with_report(None)
    }

    fn with_report(report: Option<ProcessReport>) -> Self {
        Self {
            report,
            calls: RefCell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }
}

impl TestRunner for RecordingTestRunner {
    fn run_tests(&self) -> Result<Option<ProcessReport>> {
        *self.calls.borrow_mut() += 1;
        Ok(self.report.clone())
    }
}

fn test_report(stdout: &str, code: i32) -> ProcessReport {
    ProcessReport {
        command: "cargo test".to_string(),
        code: Some(code),
        success: code == 0,
        stdout: stdout.to_string(),
    }
}

/// A git repository in a temporary directory.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Initialise an empty repository with a local identity.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir")?;
        let repo = Self { dir };
        repo.git(&["init", "--quiet"])?;
        repo.git(&["config", "user.name", "litguard tests"])?;
        repo.git(&["config", "user.email", "tests@litguard.invalid"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to a repository-relative path, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        let path = self.path().join(rel);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    /// Stage one path without committing it.
    pub fn stage(&self, rel: &str) -> Result<()> {
        self.git(&["add", "--", rel])
    }

    /// Stage everything and commit.
    pub fn commit_all(&self, message: &str) -> Result<()> {
        self.git(&["add", "-A"])?;
        self.git(&["commit", "--quiet", "--allow-empty", "-m", message])
    }

    fn git(&self, args: &[&str]) -> Result<()> {
        let argv = std::iter::once("git").chain(args.iter().copied());
        run(&Invocation::new(argv).current_dir(self.path()).quiet())?
            .ensure_success()
            .with_context(|| format!("git {}", args.join(" ")))?;
        Ok(())
    }
}

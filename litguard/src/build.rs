//! Orchestration for `litguard build`: guard, regenerate, then test.

use std::io::Write;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::check::{CheckOutcome, run_check};
use crate::core::types::LiterateSource;
use crate::io::generator::Generator;
use crate::io::git::DiffProvider;
use crate::io::process::ProcessReport;
use crate::io::state_store::StateStore;
use crate::io::test_runner::TestRunner;

/// Result of generating one literate source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub source: String,
    pub process: ProcessReport,
}

/// Outcome of `litguard build`.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// The guard refused to regenerate; nothing was written.
    Blocked(CheckOutcome),
    /// Generation and tests ran. Their failures are recorded, not raised.
    Built {
        check: CheckOutcome,
        generated: Vec<GenerationReport>,
        /// `None` when no test command is configured.
        tests: Option<ProcessReport>,
    },
}

impl BuildOutcome {
    pub fn check(&self) -> &CheckOutcome {
        match self {
            BuildOutcome::Blocked(check) => check,
            BuildOutcome::Built { check, .. } => check,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, BuildOutcome::Blocked(_))
    }
}

/// Run the guard and, if it allows, regenerate every source and run the tests.
///
/// Generation runs once per source in configuration order, skipping sources
/// marked dry-run only. There is no rollback if generation or tests fail.
pub fn run_build<D, G, S, T>(
    sources: &[LiterateSource],
    diff: &D,
    generator: &G,
    store: &S,
    tests: &T,
    out: &mut dyn Write,
) -> Result<BuildOutcome>
where
    D: DiffProvider + ?Sized,
    G: Generator + ?Sized,
    S: StateStore + ?Sized,
    T: TestRunner + ?Sized,
{
    let check = run_check(sources, diff, generator, store, out)?;
    if check.is_blocked() {
        return Ok(BuildOutcome::Blocked(check));
    }

    writeln!(out, "Start generating source files ...").context("write progress")?;
    let mut generated = Vec::new();
    for source in sources.iter().filter(|source| source.generate) {
        let process = generator
            .generate(source)
            .with_context(|| format!("generate {}", source.path))?;
        if !process.success {
            warn!(source = %source.path, exit_code = ?process.code, "generation failed");
            writeln!(
                out,
                "generating {} failed ({})",
                source.path,
                describe_exit(process.code)
            )
            .context("write progress")?;
        }
        generated.push(GenerationReport {
            source: source.path.clone(),
            process,
        });
    }
    writeln!(out, "Generating source files done!").context("write progress")?;

    let tests = tests.run_tests().context("run tests")?;
    if let Some(report) = &tests {
        out.write_all(report.stdout.as_bytes())
            .context("forward test output")?;
        if !report.success {
            warn!(exit_code = ?report.code, "tests failed");
            writeln!(out, "tests failed ({})", describe_exit(report.code))
                .context("write progress")?;
        }
    }

    info!(generated = generated.len(), "build finished");
    Ok(BuildOutcome::Built {
        check,
        generated,
        tests,
    })
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

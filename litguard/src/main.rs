//! Literate-source build guard.
//!
//! Refuses to regenerate code from literate sources when that would overwrite
//! uncommitted manual edits, and records the kind of the last change in
//! `.litstate` so that regenerating after a literate-source edit proceeds.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use litguard::build::run_build;
use litguard::check::run_check;
use litguard::core::types::BuildState;
use litguard::exit_codes;
use litguard::io::config::{DEFAULT_CONFIG_FILE, GuardConfig, load_config};
use litguard::io::generator::CommandGenerator;
use litguard::io::git::Git;
use litguard::io::state_store::{FileStateStore, StateStore};
use litguard::io::test_runner::CommandTestRunner;
use litguard::logging;

#[derive(Parser)]
#[command(
    name = "litguard",
    version,
    about = "Guard literate-source regeneration against overwriting manual edits"
)]
struct Cli {
    /// Repository root (default: the git top-level of the current directory).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (default: `litguard.toml` in the repository root).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug tracing when `RUST_LOG` is unset.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Check for conflicts, regenerate all sources, then run the tests (default).
    Build,
    /// Check for conflicts and record the state without regenerating.
    Check,
    /// Print the persisted build state.
    State,
    /// Overwrite the persisted build state, e.g. after resolving conflicts by hand.
    Reset {
        /// State to record.
        #[arg(long, default_value = "sync")]
        state: BuildState,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::ERROR);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let root = resolve_root(cli.root)?;
    let config_path = cli
        .config
        .unwrap_or_else(|| root.join(DEFAULT_CONFIG_FILE));
    let cfg = load_config(&config_path)?;
    let store = FileStateStore::new(root.join(&cfg.state_path));
    debug!(root = %root.display(), state = %store.path().display(), "resolved paths");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let code = match cli.command.unwrap_or(Command::Build) {
        Command::Build => cmd_build(&root, &cfg, &store, &mut out)?,
        Command::Check => cmd_check(&root, &cfg, &store, &mut out)?,
        Command::State => {
            writeln!(out, "{}", store.load())?;
            exit_codes::OK
        }
        Command::Reset { state } => {
            store.save(state)?;
            writeln!(out, "state set to {state}")?;
            exit_codes::OK
        }
    };
    out.flush().context("flush stdout")?;
    Ok(code)
}

fn cmd_check(
    root: &Path,
    cfg: &GuardConfig,
    store: &FileStateStore,
    out: &mut dyn Write,
) -> Result<i32> {
    let outcome = run_check(
        &cfg.sources,
        &diff_provider(root, cfg),
        &generator(root, cfg),
        store,
        out,
    )?;
    writeln!(out, "checking done")?;
    Ok(exit_code(outcome.is_blocked()))
}

fn cmd_build(
    root: &Path,
    cfg: &GuardConfig,
    store: &FileStateStore,
    out: &mut dyn Write,
) -> Result<i32> {
    let tests = CommandTestRunner::new(root, cfg.tests.command.clone())
        .with_timeout(cfg.command_timeout());
    let outcome = run_build(
        &cfg.sources,
        &diff_provider(root, cfg),
        &generator(root, cfg),
        store,
        &tests,
        out,
    )?;
    Ok(exit_code(outcome.is_blocked()))
}

fn exit_code(blocked: bool) -> i32 {
    if blocked {
        exit_codes::ERR_CONFLICTING_MODIFICATIONS
    } else {
        exit_codes::OK
    }
}

fn diff_provider(root: &Path, cfg: &GuardConfig) -> Git {
    Git::new(root)
        .with_diff_command(cfg.diff.command.clone())
        .with_timeout(cfg.command_timeout())
}

fn generator(root: &Path, cfg: &GuardConfig) -> CommandGenerator {
    CommandGenerator::new(root, cfg.generator.command.clone())
        .with_flags(&cfg.generator.dry_run_flag, &cfg.generator.output_flag)
        .with_timeout(cfg.command_timeout())
}

/// Use `--root` if given, else the enclosing git repository, else the current directory.
fn resolve_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root);
    }
    let cwd = std::env::current_dir().context("read current directory")?;
    match Git::new(&cwd).toplevel() {
        Ok(root) => Ok(root),
        Err(err) => {
            debug!(err = %err, "not inside a git repository, using current directory");
            Ok(cwd)
        }
    }
}

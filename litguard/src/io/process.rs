//! Helpers for running child processes with timeouts and captured output.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

use crate::error::GuardError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// A command line plus the directory and limits it runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<String>,
    cwd: Option<PathBuf>,
    timeout: Duration,
    forward_stderr: bool,
}

impl Invocation {
    /// `argv[0]` is the program, the rest are its arguments.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            cwd: None,
            timeout: DEFAULT_TIMEOUT,
            forward_stderr: true,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.argv.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Keep the child's stderr out of the console.
    pub fn quiet(mut self) -> Self {
        self.forward_stderr = false;
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Space-joined command line for messages.
    pub fn display(&self) -> String {
        self.argv.join(" ")
    }
}

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub command: String,
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Turn a non-zero exit into [`GuardError::ExternalProcessFailure`].
    pub fn ensure_success(self) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(GuardError::ExternalProcessFailure {
            command: self.command.clone(),
            code: self.code(),
            stderr: self.stderr_text().trim().to_string(),
        }
        .into())
    }
}

/// What an operator needs to know about a finished command whose failure is
/// reported rather than raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessReport {
    pub command: String,
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
}

impl From<CommandOutput> for ProcessReport {
    fn from(output: CommandOutput) -> Self {
        Self {
            success: output.success(),
            code: output.code(),
            stdout: output.stdout_text(),
            command: output.command,
        }
    }
}

/// Run an invocation to completion and capture its output.
///
/// Non-empty stderr is echoed to the console unless the invocation is quiet; it
/// is never treated as failure on its own, and neither is a non-zero exit. A timed-out child is killed and
/// reported as [`GuardError::Timeout`].
#[instrument(skip_all, fields(command = %invocation.display(), cwd = ?invocation.cwd()))]
pub fn run(invocation: &Invocation) -> Result<CommandOutput> {
    let (program, args) = invocation
        .argv
        .split_first()
        .ok_or_else(|| anyhow!("empty command line"))?;
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = &invocation.cwd {
        cmd.current_dir(dir);
    }

    let (status, stdout, stderr, timed_out) = run_command_with_timeout(cmd, invocation.timeout)
        .with_context(|| format!("run `{}`", invocation.display()))?;

    if timed_out {
        return Err(GuardError::Timeout {
            command: invocation.display(),
            timeout_secs: invocation.timeout.as_secs(),
        }
        .into());
    }

    let output = CommandOutput {
        command: invocation.display(),
        status,
        stdout,
        stderr,
    };
    if invocation.forward_stderr && !output.stderr.is_empty() {
        eprint!("{}", output.stderr_text());
    }
    if !output.success() {
        debug!(exit_code = ?output.code(), "command exited unsuccessfully");
    }
    Ok(output)
}

/// Run a command with a timeout and capture stdout/stderr without risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. Returns the exit status,
/// both streams, and whether the child had to be killed.
fn run_command_with_timeout(
    mut cmd: Command,
    timeout: Duration,
) -> Result<(ExitStatus, Vec<u8>, Vec<u8>, bool)> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream(stdout));
    let stderr_handle = thread::spawn(move || read_stream(stderr));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    let stdout = join_output(stdout_handle).context("join stdout")?;
    let stderr = join_output(stderr_handle).context("join stderr")?;

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok((status, stdout, stderr, timed_out))
}

fn join_output(handle: thread::JoinHandle<Result<Vec<u8>>>) -> Result<Vec<u8>> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).context("read output")?;
    Ok(buf)
}

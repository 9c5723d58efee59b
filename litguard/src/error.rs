//! Typed failures that abort a guard run.
//!
//! Most fallible functions return `anyhow::Result`; these variants are the
//! ones callers need to tell apart. They travel inside `anyhow::Error` and are
//! recovered with `downcast_ref`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardError {
    /// The generator's dry run did not print a JSON object of path to descriptor.
    #[error("malformed dry-run output for {source_path}: {reason}")]
    MalformedDryRunOutput {
        /// Literate source whose dry run was being parsed.
        source_path: String,
        reason: String,
    },

    /// A child process exited unsuccessfully where its output is required.
    #[error("`{command}` failed with {}: {stderr}", describe_code(*code))]
    ExternalProcessFailure {
        command: String,
        /// Exit code, or `None` if terminated by a signal.
        code: Option<i32>,
        stderr: String,
    },

    /// A child process exceeded the configured timeout and was killed.
    #[error("`{command}` timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}

//! Test runner adapter invoked after generation (`cargo test` by default).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, instrument};

use crate::io::process::{DEFAULT_TIMEOUT, Invocation, ProcessReport, run};

pub trait TestRunner {
    /// Run the tests. `Ok(None)` means no test command is configured.
    fn run_tests(&self) -> Result<Option<ProcessReport>>;
}

/// Test runner driven through a configurable command line in the repository root.
#[derive(Debug, Clone)]
pub struct CommandTestRunner {
    root: PathBuf,
    command: Vec<String>,
    timeout: Duration,
}

impl CommandTestRunner {
    pub fn new(root: impl Into<PathBuf>, command: Vec<String>) -> Self {
        Self {
            root: root.into(),
            command,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl TestRunner for CommandTestRunner {
    #[instrument(skip_all)]
    fn run_tests(&self) -> Result<Option<ProcessReport>> {
        if self.command.is_empty() {
            debug!("no test command configured");
            return Ok(None);
        }
        let output = run(&Invocation::new(self.command.iter().cloned())
            .current_dir(&self.root)
            .timeout(self.timeout))?;
        Ok(Some(ProcessReport::from(output)))
    }
}

//! Adapter for the literate-source generator (`lisi` by default).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::path::relative_to_workdir;
use crate::core::types::{DryRunResult, LiterateSource};
use crate::io::dry_run::parse_dry_run;
use crate::io::process::{DEFAULT_TIMEOUT, Invocation, ProcessReport, run};

/// Generator invocations for a single literate source.
pub trait Generator {
    /// Report the files generation would write, keyed relative to the source's workdir.
    fn dry_run(&self, source: &LiterateSource) -> Result<DryRunResult>;

    /// Perform the rewrite. A non-zero exit is reported, not raised.
    fn generate(&self, source: &LiterateSource) -> Result<ProcessReport>;
}

/// Generator driven through a configurable command line.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    root: PathBuf,
    command: Vec<String>,
    dry_run_flag: String,
    output_flag: String,
    timeout: Duration,
}

impl CommandGenerator {
    pub fn new(root: impl Into<PathBuf>, command: Vec<String>) -> Self {
        Self {
            root: root.into(),
            command,
            dry_run_flag: "--dry-run".to_string(),
            output_flag: "-o".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_flags(
        mut self,
        dry_run_flag: impl Into<String>,
        output_flag: impl Into<String>,
    ) -> Self {
        self.dry_run_flag = dry_run_flag.into();
        self.output_flag = output_flag.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn base(&self, source: &LiterateSource) -> Invocation {
        let cwd = match &source.workdir {
            Some(workdir) => self.root.join(workdir),
            None => self.root.clone(),
        };
        Invocation::new(self.command.iter().cloned())
            .current_dir(cwd)
            .timeout(self.timeout)
    }

    /// Build the dry-run command line for `source`.
    pub fn dry_run_invocation(&self, source: &LiterateSource) -> Invocation {
        self.base(source)
            .arg(&self.dry_run_flag)
            .arg(document_arg(source))
    }

    /// Build the real-generation command line for `source`.
    pub fn generate_invocation(&self, source: &LiterateSource) -> Invocation {
        let mut invocation = self.base(source);
        if let Some(output) = &source.output {
            invocation = invocation.arg(&self.output_flag).arg(output);
        }
        invocation.arg(document_arg(source))
    }
}

impl Generator for CommandGenerator {
    #[instrument(skip_all, fields(source = %source.path))]
    fn dry_run(&self, source: &LiterateSource) -> Result<DryRunResult> {
        let output = run(&self.dry_run_invocation(source))?
            .ensure_success()
            .with_context(|| format!("dry run for {}", source.path))?;
        let result = parse_dry_run(&source.path, &output.stdout_text())?;
        debug!(files = result.len(), "dry run parsed");
        Ok(result)
    }

    #[instrument(skip_all, fields(source = %source.path))]
    fn generate(&self, source: &LiterateSource) -> Result<ProcessReport> {
        let output = run(&self.generate_invocation(source))?;
        Ok(ProcessReport::from(output))
    }
}

/// Document path as seen from the source's working directory.
fn document_arg(source: &LiterateSource) -> String {
    match &source.workdir {
        Some(workdir) => relative_to_workdir(&source.path, workdir).to_string(),
        None => source.path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GuardError;
    use std::fs;
    use std::path::Path;

    fn lisi(root: &Path) -> CommandGenerator {
        CommandGenerator::new(root, vec!["lisi".to_string()])
    }

    #[test]
    fn dry_run_invocation_runs_in_workdir_with_relative_document() {
        let generator = lisi(Path::new("/repo"));
        let source = LiterateSource::new("lisi/lisi.adoc").in_workdir("lisi");

        let invocation = generator.dry_run_invocation(&source);
        assert_eq!(invocation.argv(), ["lisi", "--dry-run", "lisi.adoc"]);
        assert_eq!(invocation.cwd(), Some(Path::new("/repo/lisi")));
    }

    #[test]
    fn generate_invocation_passes_output_before_document() {
        let generator = lisi(Path::new("/repo"));
        let source = LiterateSource::new("asciidoctrine/asciidoctrine.adoc")
            .in_workdir("asciidoctrine")
            .with_output("../docs/asciidoctrine/asciidoctrine.lisi.html");

        let invocation = generator.generate_invocation(&source);
        assert_eq!(
            invocation.argv(),
            [
                "lisi",
                "-o",
                "../docs/asciidoctrine/asciidoctrine.lisi.html",
                "asciidoctrine.adoc"
            ]
        );
    }

    #[test]
    fn root_source_runs_in_root() {
        let generator = lisi(Path::new("/repo"));
        let invocation = generator.generate_invocation(&LiterateSource::new("README.adoc"));
        assert_eq!(invocation.argv(), ["lisi", "README.adoc"]);
        assert_eq!(invocation.cwd(), Some(Path::new("/repo")));
    }

    #[test]
    fn dry_run_parses_script_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("lisi")).expect("mkdir");
        let generator = CommandGenerator::new(
            temp.path(),
            vec![
                "sh".to_string(),
                "-c".to_string(),
                "printf '{\"src/lib.rs\":\"%s\"}' \"$1\"".to_string(),
                "lisi".to_string(),
            ],
        );
        let source = LiterateSource::new("lisi/lisi.adoc").in_workdir("lisi");

        let result = generator.dry_run(&source).expect("dry run");
        // `$1` is the dry-run flag, so it appears as the descriptor.
        assert_eq!(result["src/lib.rs"], serde_json::json!("--dry-run"));
    }

    #[test]
    fn failing_dry_run_is_fatal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let generator = CommandGenerator::new(
            temp.path(),
            vec!["sh".to_string(), "-c".to_string(), "exit 2".to_string()],
        );

        let err = generator
            .dry_run(&LiterateSource::new("README.adoc"))
            .expect_err("dry run should fail");
        assert!(matches!(
            err.downcast_ref::<GuardError>(),
            Some(GuardError::ExternalProcessFailure { code: Some(2), .. })
        ));
    }

    #[test]
    fn failing_generation_is_reported() {
        let temp = tempfile::tempdir().expect("tempdir");
        let generator = CommandGenerator::new(
            temp.path(),
            vec!["sh".to_string(), "-c".to_string(), "exit 1".to_string()],
        );

        let report = generator
            .generate(&LiterateSource::new("README.adoc"))
            .expect("report");
        assert!(!report.success);
        assert_eq!(report.code, Some(1));
    }
}

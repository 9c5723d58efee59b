//! Guard configuration stored in `litguard.toml` at the repository root.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::types::LiterateSource;
use crate::io::state_store::DEFAULT_STATE_FILE;

pub const DEFAULT_CONFIG_FILE: &str = "litguard.toml";

/// Guard configuration (TOML).
///
/// Missing fields default to the layout of the `lisi` repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GuardConfig {
    /// State file, relative to the repository root.
    pub state_path: String,

    /// Upper bound for any single child process, in seconds.
    pub command_timeout_secs: u64,

    pub generator: GeneratorConfig,

    pub diff: DiffConfig,

    pub tests: TestsConfig,

    /// Literate documents, dry-run and generated in order.
    pub sources: Vec<LiterateSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub command: Vec<String>,
    pub dry_run_flag: String,
    pub output_flag: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiffConfig {
    /// Command printing one modified path per line (or NUL-separated), relative
    /// to the repository root. Empty uses the built-in `git diff HEAD` listing.
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TestsConfig {
    /// Command run after generation. Empty disables the test step.
    pub command: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            command: vec!["lisi".to_string()],
            dry_run_flag: "--dry-run".to_string(),
            output_flag: "-o".to_string(),
        }
    }
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "cargo".to_string(),
                "test".to_string(),
                "--color=always".to_string(),
            ],
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            state_path: DEFAULT_STATE_FILE.to_string(),
            command_timeout_secs: 30 * 60,
            generator: GeneratorConfig::default(),
            diff: DiffConfig::default(),
            tests: TestsConfig::default(),
            sources: default_sources(),
        }
    }
}

fn default_sources() -> Vec<LiterateSource> {
    vec![
        LiterateSource::new("README.adoc").dry_run_only(),
        LiterateSource::new("asciidoctrine/asciidoctrine.adoc")
            .in_workdir("asciidoctrine")
            .with_output("../docs/asciidoctrine/asciidoctrine.lisi.html"),
        LiterateSource::new("lisi/lisi.adoc").in_workdir("lisi"),
    ]
}

impl GuardConfig {
    pub fn validate(&self) -> Result<()> {
        if self.state_path.trim().is_empty() {
            return Err(anyhow!("state_path must not be empty"));
        }
        if self.command_timeout_secs == 0 {
            return Err(anyhow!("command_timeout_secs must be > 0"));
        }
        ensure_command("generator.command", &self.generator.command)?;
        if !self.diff.command.is_empty() {
            ensure_command("diff.command", &self.diff.command)?;
        }
        if !self.tests.command.is_empty() {
            ensure_command("tests.command", &self.tests.command)?;
        }
        if self.generator.dry_run_flag.trim().is_empty() {
            return Err(anyhow!("generator.dry_run_flag must not be empty"));
        }
        if self.sources.is_empty() {
            return Err(anyhow!("at least one [[sources]] entry is required"));
        }
        for source in &self.sources {
            ensure_relative("sources.path", &source.path)?;
            if let Some(workdir) = &source.workdir {
                ensure_relative("sources.workdir", workdir)?;
            }
            if source.output.is_some() && self.generator.output_flag.trim().is_empty() {
                return Err(anyhow!(
                    "source {} sets output but generator.output_flag is empty",
                    source.path
                ));
            }
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Repository-relative paths of all literate documents.
    pub fn source_paths(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|source| source.path.as_str())
    }
}

fn ensure_command(field: &str, command: &[String]) -> Result<()> {
    if command.is_empty() || command[0].trim().is_empty() {
        return Err(anyhow!("{field} must be a non-empty array"));
    }
    Ok(())
}

fn ensure_relative(field: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(anyhow!("{field} must not be empty"));
    }
    if Path::new(path).is_absolute() {
        return Err(anyhow!("{field} must be relative to the repository root: {path}"));
    }
    Ok(())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `GuardConfig::default()`.
pub fn load_config(path: &Path) -> Result<GuardConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        let cfg = GuardConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GuardConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    debug!(path = %path.display(), sources = cfg.sources.len(), "config loaded");
    Ok(cfg)
}

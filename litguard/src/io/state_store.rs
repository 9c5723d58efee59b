//! Persisted build state (`.litstate` by default).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::types::BuildState;

pub const DEFAULT_STATE_FILE: &str = ".litstate";

/// Load/save access to the single persisted state token.
pub trait StateStore {
    /// Read the persisted state, falling back to `manual code changes`.
    fn load(&self) -> BuildState;

    /// Replace the persisted state.
    fn save(&self, state: BuildState) -> Result<()>;
}

/// State stored as a bare token in a plain-text file.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> BuildState {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    err = %err,
                    "state unreadable, assuming manual code changes"
                );
                return BuildState::default();
            }
        };
        match contents.parse::<BuildState>() {
            Ok(state) => {
                debug!(path = %self.path.display(), state = %state, "state loaded");
                state
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    err = %err,
                    "state unrecognised, assuming manual code changes"
                );
                BuildState::default()
            }
        }
    }

    fn save(&self, state: BuildState) -> Result<()> {
        debug!(path = %self.path.display(), state = %state, "writing state");
        write_atomic(&self.path, state.as_token())
    }
}

/// Write via a sibling temp file and rename, so readers never see a partial token.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut tmp_name = path
        .file_name()
        .with_context(|| format!("state path has no file name {}", path.display()))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp state {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace state {}", path.display()))?;
    Ok(())
}

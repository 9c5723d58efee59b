//! Dry-run aggregation across all configured literate sources.

use anyhow::Result;
use tracing::{debug, instrument, warn};

use crate::core::path::remap_keys;
use crate::core::types::{DryRunResult, LiterateSource};
use crate::error::GuardError;
use crate::io::generator::Generator;

/// Parse one dry-run's stdout as a JSON object of path to descriptor.
pub fn parse_dry_run(source_path: &str, stdout: &str) -> Result<DryRunResult> {
    serde_json::from_str::<DryRunResult>(stdout).map_err(|err| {
        GuardError::MalformedDryRunOutput {
            source_path: source_path.to_string(),
            reason: err.to_string(),
        }
        .into()
    })
}

/// Dry-run every source in order and merge the results under repository-relative keys.
///
/// Sources with a working directory have their keys prefixed with it. Colliding
/// keys keep the value from the later source.
#[instrument(skip_all, fields(sources = sources.len()))]
pub fn collect_dry_run<G: Generator + ?Sized>(
    generator: &G,
    sources: &[LiterateSource],
) -> Result<DryRunResult> {
    let mut merged = DryRunResult::new();
    for source in sources {
        let raw = generator.dry_run(source)?;
        let result = match &source.workdir {
            Some(workdir) => remap_keys(workdir, raw),
            None => raw,
        };
        debug!(source = %source.path, files = result.len(), "merging dry run");
        for (path, descriptor) in result {
            if merged.insert(path.clone(), descriptor).is_some() {
                warn!(
                    path = %path,
                    source = %source.path,
                    "dry-run key reported by several sources"
                );
            }
        }
    }
    Ok(merged)
}

//! Stable exit codes for litguard CLI commands.

/// Command succeeded; generation (if requested) was allowed to run.
pub const OK: i32 = 0;
/// Generation would overwrite uncommitted manual edits.
pub const ERR_CONFLICTING_MODIFICATIONS: i32 = 1;
/// Command failed due to invalid config, a failing collaborator, or other errors.
pub const ERROR: i32 = 2;

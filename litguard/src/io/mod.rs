//! I/O adapters for the guard: child processes, git, the generator, the test
//! runner, configuration and the persisted state file.

pub mod config;
pub mod dry_run;
pub mod generator;
pub mod git;
pub mod process;
pub mod state_store;
pub mod test_runner;

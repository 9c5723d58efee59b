//! Change-conflict guard for literate-programming builds.
//!
//! Before the generator rewrites files from their literate sources, the guard
//! checks whether any of those files carry uncommitted manual edits that the
//! rewrite would silently destroy, and tracks a small persisted state so that
//! regenerating after an edit to the literate source itself is not mistaken
//! for a conflict. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (change parsing, path remapping,
//!   reconciliation). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (child processes, git, the state
//!   file, configuration). Behind traits so tests can substitute fakes.
//!
//! Orchestration modules ([`check`], [`build`]) coordinate core logic with I/O
//! to implement CLI commands.

pub mod build;
pub mod check;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

//! Deterministic, pure logic shared by the guard.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod changes;
pub mod path;
pub mod reconcile;
pub mod types;

//! File output and process-level concerns for the CLI.
//!
//! This module provides:
//! - Atomic file replacement shared by every writer in the crate
//! - Exit codes derived from error classes

mod atomic;
pub mod exit_code;

pub use atomic::write_atomic;
pub use exit_code::ExitCode;

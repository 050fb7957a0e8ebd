//! Reusable operations for sync, evaluation and toolchain hooks
//!
//! These functions are used by multiple commands to avoid code duplication
//! and ensure consistent behavior across the CLI.

pub mod evaluate;
pub mod sync;
pub mod toolchain;

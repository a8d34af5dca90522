//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod export;
pub mod list_failed;
pub mod rerun;
pub mod status;

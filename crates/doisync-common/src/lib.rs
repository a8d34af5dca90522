//! DOI sync common library
//!
//! Shared value types, error handling, and logging for the DOI synchronization
//! workspace.
//!
//! # Overview
//!
//! - **Types**: the [`Doi`](types::Doi) value and the closed
//!   [`DoiStatus`](types::DoiStatus) / [`DoiType`](types::DoiType) enums
//! - **Error Handling**: [`DoisyncError`] and the [`Result`] alias
//! - **Logging**: tracing subscriber bootstrap shared by the server and CLI
//!
//! # Example
//!
//! ```no_run
//! use doisync_common::types::{Doi, DoiStatus};
//!
//! fn main() -> doisync_common::Result<()> {
//!     let doi: Doi = "doi:10.15468/dl.abc123".parse()?;
//!     println!("{} is {}", doi, DoiStatus::New);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{DoisyncError, Result};

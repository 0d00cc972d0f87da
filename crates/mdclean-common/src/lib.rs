//! mdclean Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities and error handling for the mdclean workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`MdError`] and the [`Result`] alias
//! - **Checksums**: SHA-256 digests used to fingerprint input files
//! - **Logging**: `tracing` subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use mdclean_common::{checksum, Result};
//!
//! fn fingerprint(path: &str) -> Result<()> {
//!     let digest = checksum::sha256_file(path)?;
//!     println!("{path}: {digest}");
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{MdError, Result};

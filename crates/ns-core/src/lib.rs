//! # ns-core
//!
//! Core types and traits shared by the NextStat cost-function crates.
//!
//! - [`Error`] / [`Result`]: workspace-wide error handling.
//! - [`Cost`] / [`Describe`]: the contract between cost terms and minimizers.
//! - [`Precision`]: element precision used to key kernel dispatch.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{Cost, Describe, ERRORDEF, describe};
pub use types::{CallRecord, Precision};

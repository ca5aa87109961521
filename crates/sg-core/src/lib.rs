//! # sg-core
//!
//! Shared building blocks for systgen: the error taxonomy and the row-major
//! point containers passed between samplers, systematics and writers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Label, PointSet};

/// Crate version, reported by `systgen version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

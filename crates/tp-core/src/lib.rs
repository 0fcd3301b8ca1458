//! # tp-core
//!
//! Core types for the tagperf flavor-tagging diagnostics toolkit: the error
//! enum shared across all crates, the jet-flavor vocabulary, and the flat
//! N-dimensional array the numeric transforms operate on.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Flavor, FlavorOrdering, NdArray};

/// Version of the tagperf toolkit.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

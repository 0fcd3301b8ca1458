//! # tp-perf
//!
//! The numeric core of tagperf: cumulative histogram integration,
//! efficiency/rejection conversion, the rejection-rejection grid builder
//! with its cache, the monotonic efficiency maximizer, and
//! constant-working-point extraction.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod convert;
pub mod integrate;
pub mod monotonic;
pub mod rejrej;
pub mod workpoint;

pub use cache::{build_and_cache, BuildOutcome, GridCache};
pub use convert::{efficiency, rejection};
pub use integrate::integrate;
pub use monotonic::maximize_efficiency;
pub use rejrej::{build_grid, GridSpec, RejRejGrid, SENTINEL};
pub use workpoint::{
    fixed_background_curve, rejection_at_efficiency, Rejection, WorkingPointCurve,
};

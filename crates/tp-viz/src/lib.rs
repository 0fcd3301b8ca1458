//! # tp-viz
//!
//! Visualization data artifacts for tagperf.
//!
//! This crate is intentionally dependency-light and focuses on emitting
//! plot-friendly JSON structures (arrays instead of nested objects).
//! Pixel/vector rendering is a downstream consumer.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binned_eff;
pub mod check;
pub mod colors;
pub mod cprob;
pub mod cutplane;
pub mod names;
pub mod ptbins;
pub mod ratio;
pub mod rejmap;
pub mod roc;
pub mod wpscan;

pub use colors::ColorScheme;
pub use rejmap::{IsoEffLine, RejMapArtifact};

/// `n` evenly spaced values from `low` to `high` inclusive.
pub(crate) fn linspace(low: f64, high: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![low];
    }
    let step = (high - low) / (n - 1) as f64;
    (0..n).map(|i| low + step * i as f64).collect()
}

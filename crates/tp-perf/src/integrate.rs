//! Histogram integration: raw per-bin counts to cumulative counts.
//!
//! Input convention: axis index 0 is the loosest cut and increasing index
//! tightens the cut. The integrated value at (i, j, ...) is the sum of all
//! counts at index >= (i, j, ...) in every axis, so it reads "events passing
//! a cut at or tighter than this bin". Realized by reversing every axis and
//! then cumulative-summing along each axis in turn; in the output, index 0
//! is the tightest cut.

use tp_core::NdArray;

/// Integrate a raw count array. Works for any rank; 1D tagger-output
/// spectra and 2D discriminant planes are the exercised cases.
pub fn integrate(counts: &NdArray) -> NdArray {
    let mut out = counts.clone();
    for axis in 0..out.rank() {
        out.reverse_axis(axis);
    }
    for axis in 0..out.rank() {
        out.cumsum_axis(axis);
    }
    out
}

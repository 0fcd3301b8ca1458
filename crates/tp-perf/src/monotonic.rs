//! Monotonic efficiency maximization.
//!
//! It is not reasonable to quote less efficiency at a looser cut than a
//! tighter cut already achieved, so a raw rejection-rejection grid is
//! post-processed with a running maximum scanned from the high-rejection
//! end of each axis toward the low end. Sparse-statistics holes (sentinel
//! cells) pick up the best neighboring value in the same pass.
//!
//! Cheap enough to recompute on every render; never cached.

use crate::rejrej::RejRejGrid;

/// Running-maximum pass over a flat row-major `[x][y]` square grid, first
/// along axis 0 then along axis 1, each scanned from the far edge inward.
pub fn maximize_efficiency(data: &[f64], n_bins: usize) -> Vec<f64> {
    debug_assert_eq!(data.len(), n_bins * n_bins);
    let mut out = data.to_vec();
    for y in 0..n_bins {
        for x in (0..n_bins.saturating_sub(1)).rev() {
            let next = out[(x + 1) * n_bins + y];
            let cell = &mut out[x * n_bins + y];
            if next > *cell {
                *cell = next;
            }
        }
    }
    for x in 0..n_bins {
        let row = &mut out[x * n_bins..(x + 1) * n_bins];
        for y in (0..n_bins.saturating_sub(1)).rev() {
            if row[y + 1] > row[y] {
                row[y] = row[y + 1];
            }
        }
    }
    out
}

impl RejRejGrid {
    /// The grid's efficiency buffer after the monotonic maximization pass.
    pub fn maximized(&self) -> Vec<f64> {
        maximize_efficiency(self.data(), self.n_bins)
    }
}

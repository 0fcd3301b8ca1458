//! The rejection-rejection grid: one efficiency field re-binned onto a 2D
//! grid whose axes are log-spaced rejection values of two background
//! flavors, keeping the best efficiency seen per cell.

use serde::{Deserialize, Serialize};
use tp_core::{Error, FlavorOrdering, NdArray, Result};

/// Grid cell value meaning "no input bin ever mapped here". Consumers must
/// treat this separately from a genuine zero efficiency.
pub const SENTINEL: f64 = -1.0;

/// How often the placement loop reports progress, in samples.
const PROGRESS_EVERY: usize = 20_000;

/// Axis extents, resolution, and flavor ordering for one grid build.
/// Extents are rejection values, not recomputed from data; callers override
/// them per tagger when the defaults clip the interesting region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of bins per axis.
    pub n_bins: usize,
    /// Lower x-rejection extent.
    pub x_min: f64,
    /// Upper x-rejection extent.
    pub x_max: f64,
    /// Lower y-rejection extent.
    pub y_min: f64,
    /// Upper y-rejection extent.
    pub y_max: f64,
    /// Which flavor is on which axis.
    pub ordering: FlavorOrdering,
}

impl Default for GridSpec {
    fn default() -> GridSpec {
        GridSpec {
            n_bins: 100,
            x_min: 1.0,
            x_max: 200.0,
            y_min: 1.0,
            y_max: 1000.0,
            ordering: FlavorOrdering::buc(),
        }
    }
}

impl GridSpec {
    fn validate(&self) -> Result<()> {
        let bounds = [self.x_min, self.x_max, self.y_min, self.y_max];
        if bounds.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(Error::Validation(format!(
                "grid extents must be finite and positive, got {bounds:?}"
            )));
        }
        if self.x_min >= self.x_max || self.y_min >= self.y_max {
            return Err(Error::Validation(format!(
                "grid extents must satisfy min < max, got {bounds:?}"
            )));
        }
        if self.n_bins < 2 {
            return Err(Error::Validation(format!(
                "grid needs at least 2 bins per axis, got {}",
                self.n_bins
            )));
        }
        Ok(())
    }
}

/// The persisted cache artifact: a square efficiency grid plus the axis
/// extents and flavor ordering it was built with. Never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejRejGrid {
    /// Bins per axis.
    pub n_bins: usize,
    /// Lower x-rejection extent.
    pub x_min: f64,
    /// Upper x-rejection extent.
    pub x_max: f64,
    /// Lower y-rejection extent.
    pub y_min: f64,
    /// Upper y-rejection extent.
    pub y_max: f64,
    /// Which flavor is on which axis.
    pub ordering: FlavorOrdering,
    data: Vec<f64>,
}

impl RejRejGrid {
    /// Rebuild a grid from stored parts (the cache read path). The buffer
    /// is row-major `[x_bin][y_bin]`.
    pub fn from_parts(
        n_bins: usize,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
        ordering: FlavorOrdering,
        data: Vec<f64>,
    ) -> Result<RejRejGrid> {
        if data.len() != n_bins * n_bins {
            return Err(Error::Validation(format!(
                "grid buffer has {} cells, expected {n_bins}x{n_bins}",
                data.len()
            )));
        }
        Ok(RejRejGrid { n_bins, x_min, x_max, y_min, y_max, ordering, data })
    }

    /// Cell value at (x_bin, y_bin).
    pub fn at(&self, x_bin: usize, y_bin: usize) -> f64 {
        self.data[x_bin * self.n_bins + y_bin]
    }

    /// Flat row-major `[x_bin][y_bin]` buffer.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Log-spaced x-axis rejection values, one per bin.
    pub fn x_values(&self) -> Vec<f64> {
        log_spaced(self.x_min, self.x_max, self.n_bins)
    }

    /// Log-spaced y-axis rejection values, one per bin.
    pub fn y_values(&self) -> Vec<f64> {
        log_spaced(self.y_min, self.y_max, self.n_bins)
    }

    /// True when no input sample ever landed in the grid.
    pub fn is_all_sentinel(&self) -> bool {
        self.data.iter().all(|&v| v == SENTINEL)
    }
}

/// `n` log-spaced values from `low` to `high` inclusive.
pub fn log_spaced(low: f64, high: f64, n: usize) -> Vec<f64> {
    let (l0, l1) = (low.log10(), high.log10());
    let step = (l1 - l0) / (n - 1) as f64;
    (0..n).map(|i| 10f64.powf(l0 + step * i as f64)).collect()
}

/// Bin index of `v` against sorted edges: the number of edges at or below
/// `v`, minus one. Below the first edge gives −1; at or beyond the last
/// edge clips into the top bin.
fn digitize(edges: &[f64], v: f64) -> isize {
    edges.partition_point(|&e| e <= v) as isize - 1
}

/// Re-bin one efficiency field and two rejection fields (all on the same
/// discriminant grid) into a rejection-rejection grid.
///
/// Cells with infinite rejection on either axis cannot be placed on a
/// finite log grid and are skipped. Samples below the lowest edge are
/// dropped rather than wrapped into the far bin; samples at or beyond the
/// top edge clip into the top bin. Each surviving sample raises its cell to
/// the maximum efficiency seen there.
pub fn build_grid(
    eff: &NdArray,
    x_rej: &NdArray,
    y_rej: &NdArray,
    spec: &GridSpec,
) -> Result<RejRejGrid> {
    spec.validate()?;
    if eff.shape() != x_rej.shape() || eff.shape() != y_rej.shape() {
        return Err(Error::Validation(format!(
            "field shapes differ: eff {:?}, x_rej {:?}, y_rej {:?}",
            eff.shape(),
            x_rej.shape(),
            y_rej.shape()
        )));
    }

    let n = spec.n_bins;
    let x_edges = log_spaced(spec.x_min, spec.x_max, n);
    let y_edges = log_spaced(spec.y_min, spec.y_max, n);

    let mut data = vec![SENTINEL; n * n];
    let total = eff.len();
    let mut placed = 0usize;
    for (i, ((&z, &xr), &yr)) in
        eff.data().iter().zip(x_rej.data()).zip(y_rej.data()).enumerate()
    {
        if i % PROGRESS_EVERY == 0 && i > 0 {
            tracing::debug!(sample = i, total, "placing rejrej samples");
        }
        if !xr.is_finite() || !yr.is_finite() {
            continue;
        }
        let xb = digitize(&x_edges, xr);
        let yb = digitize(&y_edges, yr);
        if xb < 0 || yb < 0 {
            continue;
        }
        let cell = &mut data[xb as usize * n + yb as usize];
        if z > *cell {
            *cell = z;
        }
        placed += 1;
    }
    if placed == 0 {
        // All-infinite rejections leave an all-sentinel grid; not an error,
        // but renderers need to cope, so make it visible.
        tracing::warn!(total, "no samples survived finiteness filtering");
    }

    Ok(RejRejGrid {
        n_bins: n,
        x_min: spec.x_min,
        x_max: spec.x_max,
        y_min: spec.y_min,
        y_max: spec.y_max,
        ordering: spec.ordering,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn field(vals: Vec<f64>) -> NdArray {
        let n = vals.len();
        NdArray::new(vec![n], vals).unwrap()
    }

    fn unit_spec() -> GridSpec {
        GridSpec { n_bins: 10, x_min: 1.0, x_max: 100.0, y_min: 1.0, y_max: 100.0, ..Default::default() }
    }

    #[test]
    fn log_spacing_hits_both_ends() {
        let vals = log_spaced(1.0, 1000.0, 4);
        assert_relative_eq!(vals[0], 1.0);
        assert_relative_eq!(vals[1], 10.0, max_relative = 1e-12);
        assert_relative_eq!(vals[3], 1000.0, max_relative = 1e-12);
    }

    #[test]
    fn digitize_drops_low_and_clips_high() {
        let edges = log_spaced(1.0, 100.0, 5);
        assert_eq!(digitize(&edges, 0.5), -1);
        assert_eq!(digitize(&edges, 1.0), 0);
        assert_eq!(digitize(&edges, 100.0), 4);
        assert_eq!(digitize(&edges, 5000.0), 4);
    }

    #[test]
    fn keeps_the_best_efficiency_per_cell() {
        let eff = field(vec![0.3, 0.7, 0.5]);
        // all three samples land in the same cell
        let xr = field(vec![2.0, 2.0, 2.0]);
        let yr = field(vec![3.0, 3.0, 3.0]);
        let grid = build_grid(&eff, &xr, &yr, &unit_spec()).unwrap();
        let best = grid.data().iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(best, 0.7);
        assert_eq!(grid.data().iter().filter(|&&v| v != SENTINEL).count(), 1);
    }

    #[test]
    fn infinite_rejections_are_excluded() {
        // zero-count background cells report infinite
        // rejection and never reach the grid.
        let eff = field(vec![0.9, 0.8]);
        let xr = field(vec![f64::INFINITY, 2.0]);
        let yr = field(vec![3.0, f64::INFINITY]);
        let grid = build_grid(&eff, &xr, &yr, &unit_spec()).unwrap();
        assert!(grid.is_all_sentinel());
    }

    #[test]
    fn below_range_samples_are_dropped_not_wrapped() {
        let eff = field(vec![0.9]);
        let xr = field(vec![0.5]);
        let yr = field(vec![3.0]);
        let grid = build_grid(&eff, &xr, &yr, &unit_spec()).unwrap();
        assert!(grid.is_all_sentinel());
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let eff = field(vec![0.9, 0.8]);
        let xr = field(vec![2.0]);
        let yr = field(vec![3.0, 4.0]);
        assert!(build_grid(&eff, &xr, &yr, &unit_spec()).is_err());
    }

    #[test]
    fn bad_extents_are_rejected() {
        let spec = GridSpec { x_min: 0.0, ..Default::default() };
        let eff = field(vec![0.9]);
        assert!(build_grid(&eff, &eff, &eff, &spec).is_err());
        let spec = GridSpec { y_min: 10.0, y_max: 5.0, ..Default::default() };
        assert!(build_grid(&eff, &eff, &eff, &spec).is_err());
    }
}

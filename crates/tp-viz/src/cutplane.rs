//! Discriminant cut-plane artifacts: the per-flavor 2D count planes
//! cropped to the standard display windows, with the operating-point cut
//! marked, and 1D projections of the same planes along either axis.
//!
//! Stored planes include under/overflow bins on each axis; those are
//! stripped here, and the axis extents come from the per-axis `min`/`max`
//! dataset attributes.

use crate::linspace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tp_core::{Error, Flavor, Result};
use tp_store::{ArrayStore, Dataset};

/// Display window of the anti-light discriminant (the x axis).
pub const ANTI_LIGHT_RANGE: (f64, f64) = (-4.5, 5.0);
/// Display window of the anti-b discriminant (the y axis).
pub const ANTI_B_RANGE: (f64, f64) = (-7.0, 3.5);
/// Operating-point cut on the anti-b discriminant.
pub const ANTI_B_CUT: f64 = -0.9;
/// Operating-point cut on the anti-light discriminant.
pub const ANTI_LIGHT_CUT: f64 = 0.95;

/// Default rebinning factor for the 1D projections.
pub const DEFAULT_REBIN: usize = 5;

/// A 2D count plane with its bin-edge coordinates, flows stripped.
///
/// Stored planes are indexed `[anti_b][anti_light]`; this keeps them as
/// `[y][x]` rows so x is the anti-light axis.
#[derive(Debug, Clone)]
pub struct CountPlane {
    x_edges: Vec<f64>,
    y_edges: Vec<f64>,
    rows: Vec<Vec<f64>>,
}

/// Projection axis for [`CountPlane::project`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// The anti-light discriminant.
    X,
    /// The anti-b discriminant.
    Y,
}

impl CountPlane {
    /// Build from a stored discriminant plane: strip the flow bins and read
    /// the axis extents from the `min`/`max` attributes (per-axis lists,
    /// axis 0 = anti-b, axis 1 = anti-light).
    pub fn from_dataset(ds: &Dataset) -> Result<CountPlane> {
        let shape = ds.array.shape();
        if ds.array.rank() != 2 || shape[0] < 3 || shape[1] < 3 {
            return Err(Error::Validation(format!(
                "cut plane needs a 2D histogram with flow bins, got shape {shape:?}"
            )));
        }
        let mins = ds
            .attr_numbers("min")
            .ok_or_else(|| Error::Validation("cut plane lacks 'min' attribute".into()))?;
        let maxes = ds
            .attr_numbers("max")
            .ok_or_else(|| Error::Validation("cut plane lacks 'max' attribute".into()))?;
        if mins.len() != 2 || maxes.len() != 2 {
            return Err(Error::Validation(format!(
                "cut plane needs per-axis min/max, got {} and {} entries",
                mins.len(),
                maxes.len()
            )));
        }

        let (ny, nx) = (shape[0] - 2, shape[1] - 2);
        let mut rows = vec![vec![0.0; nx]; ny];
        for (y, row) in rows.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = ds.array.at2(y + 1, x + 1);
            }
        }
        Ok(CountPlane {
            x_edges: linspace(mins[1], maxes[1], nx + 1),
            y_edges: linspace(mins[0], maxes[0], ny + 1),
            rows,
        })
    }

    /// The plane cropped to the given axis windows, `[y][x]` rows.
    pub fn subplane(&self, xlims: (f64, f64), ylims: (f64, f64)) -> Vec<Vec<f64>> {
        let (x_lo, x_hi) = edge_window(&self.x_edges, xlims);
        let (y_lo, y_hi) = edge_window(&self.y_edges, ylims);
        self.rows[y_lo..y_hi].iter().map(|row| row[x_lo..x_hi].to_vec()).collect()
    }

    /// Sum the plane along the other axis within `lims`, then rebin by
    /// `rebin` and normalize to unit area. Returns (bin left edges, bin
    /// fractions).
    pub fn project(
        &self,
        axis: Axis,
        lims: (f64, f64),
        rebin: usize,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        if rebin == 0 {
            return Err(Error::Validation("rebin factor must be at least 1".into()));
        }
        let edges = match axis {
            Axis::X => &self.x_edges,
            Axis::Y => &self.y_edges,
        };
        let (lo, hi) = edge_window(edges, lims);
        let mut counts: Vec<f64> = (lo..hi)
            .map(|i| match axis {
                Axis::X => self.rows.iter().map(|row| row[i]).sum(),
                Axis::Y => self.rows[i].iter().sum(),
            })
            .collect();
        counts.truncate(counts.len() / rebin * rebin);

        let mut xs = Vec::with_capacity(counts.len() / rebin);
        let mut ys = Vec::with_capacity(counts.len() / rebin);
        for (chunk_idx, chunk) in counts.chunks_exact(rebin).enumerate() {
            xs.push(edges[lo + chunk_idx * rebin]);
            ys.push(chunk.iter().sum());
        }
        let total: f64 = ys.iter().sum();
        if total > 0.0 {
            for y in &mut ys {
                *y /= total;
            }
        }
        Ok((xs, ys))
    }
}

/// Indices of the edge window covered by `lims`, clamped to the plane.
fn edge_window(edges: &[f64], lims: (f64, f64)) -> (usize, usize) {
    let lo = edges.partition_point(|&e| e < lims.0);
    let hi = edges.partition_point(|&e| e <= lims.1).saturating_sub(1);
    (lo.min(edges.len() - 1), hi.max(lo))
}

/// Per-flavor cropped count planes with the cut marked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutPlaneArtifact {
    /// Tagger whose discriminant plane this is.
    pub tagger: String,
    /// X (anti-light) window.
    pub x_range: (f64, f64),
    /// Y (anti-b) window.
    pub y_range: (f64, f64),
    /// Anti-light cut value.
    pub x_cut: f64,
    /// Anti-b cut value.
    pub y_cut: f64,
    /// X-axis label.
    pub x_label: String,
    /// Y-axis label.
    pub y_label: String,
    /// Cropped counts per flavor key, `[y][x]` rows.
    pub planes: BTreeMap<char, Vec<Vec<f64>>>,
}

impl CutPlaneArtifact {
    /// Build from the B/C/U planes stored under `{flavor}/{tagger}`.
    pub fn from_store(store: &ArrayStore, tagger: &str) -> Result<CutPlaneArtifact> {
        let mut planes = BTreeMap::new();
        for flavor in [Flavor::B, Flavor::C, Flavor::U] {
            let ds = store.get(&format!("{}/{}", flavor.key(), tagger))?;
            let plane = CountPlane::from_dataset(ds)?;
            planes.insert(flavor.key(), plane.subplane(ANTI_LIGHT_RANGE, ANTI_B_RANGE));
        }
        Ok(CutPlaneArtifact {
            tagger: tagger.to_string(),
            x_range: ANTI_LIGHT_RANGE,
            y_range: ANTI_B_RANGE,
            x_cut: ANTI_LIGHT_CUT,
            y_cut: ANTI_B_CUT,
            x_label: "$\\log(P_{c} / P_{\\rm light})$".to_string(),
            y_label: "$\\log(P_{c} / P_{b})$".to_string(),
            planes,
        })
    }
}

/// One flavor's projected discriminant distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutLineCurve {
    /// Flavor key.
    pub flavor: char,
    /// Legend label, e.g. "charm jets".
    pub label: String,
    /// Left bin edges after rebinning.
    pub x: Vec<f64>,
    /// Fraction of jets per bin (unit area).
    pub fraction: Vec<f64>,
}

/// 1D projections of the B/C/U planes along one discriminant axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutLineArtifact {
    /// Tagger whose discriminant plane this is.
    pub tagger: String,
    /// Which axis was kept.
    pub axis: Axis,
    /// X-axis label naming the discriminated flavor.
    pub x_label: String,
    /// The plotted window.
    pub range: (f64, f64),
    /// One curve per flavor.
    pub curves: Vec<CutLineCurve>,
}

impl CutLineArtifact {
    /// Build the projection artifact for one axis.
    pub fn from_store(
        store: &ArrayStore,
        tagger: &str,
        axis: Axis,
        rebin: usize,
    ) -> Result<CutLineArtifact> {
        let (range, discriminated) = match axis {
            Axis::X => (ANTI_LIGHT_RANGE, "\\mathrm{light}"),
            Axis::Y => (ANTI_B_RANGE, "b"),
        };
        let mut curves = Vec::new();
        for flavor in [Flavor::B, Flavor::C, Flavor::U] {
            let ds = store.get(&format!("{}/{}", flavor.key(), tagger))?;
            let plane = CountPlane::from_dataset(ds)?;
            let (x, fraction) = plane.project(axis, range, rebin)?;
            curves.push(CutLineCurve {
                flavor: flavor.key(),
                label: format!("{} jets", flavor.long_name()),
                x,
                fraction,
            });
        }
        Ok(CutLineArtifact {
            tagger: tagger.to_string(),
            axis,
            x_label: format!("$\\log(P_{{c}} / P_{{{discriminated}}})$"),
            range,
            curves,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::NdArray;
    use tp_store::AttrValue;

    /// 8x10 core bins (+2 flows each axis), y in [-8, 8], x in [-5, 5].
    fn sample_plane() -> Dataset {
        let (ny, nx) = (10, 12);
        let mut data = Vec::with_capacity(ny * nx);
        for y in 0..ny {
            for x in 0..nx {
                data.push((y * nx + x) as f64);
            }
        }
        Dataset::new(NdArray::new(vec![ny, nx], data).unwrap())
            .with_attr("min", AttrValue::Numbers(vec![-8.0, -5.0]))
            .with_attr("max", AttrValue::Numbers(vec![8.0, 5.0]))
    }

    #[test]
    fn flows_are_stripped_and_edges_span_the_extent() {
        let plane = CountPlane::from_dataset(&sample_plane()).unwrap();
        let full = plane.subplane((-5.0, 5.0), (-8.0, 8.0));
        assert_eq!(full.len(), 8);
        assert_eq!(full[0].len(), 10);
        // the first core cell is at (y=1, x=1) of the stored array
        assert_eq!(full[0][0], 13.0);
    }

    #[test]
    fn subplane_crops_to_the_window() {
        let plane = CountPlane::from_dataset(&sample_plane()).unwrap();
        let full = plane.subplane((-5.0, 5.0), (-8.0, 8.0));
        let cropped = plane.subplane((-2.0, 2.0), (-4.0, 4.0));
        assert!(cropped.len() < full.len());
        assert!(cropped[0].len() < full[0].len());
    }

    #[test]
    fn projection_is_unit_area_after_rebin() {
        let plane = CountPlane::from_dataset(&sample_plane()).unwrap();
        let (xs, ys) = plane.project(Axis::X, (-5.0, 5.0), 2).unwrap();
        assert_eq!(xs.len(), ys.len());
        let total: f64 = ys.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_extent_attributes_are_rejected() {
        let ds = Dataset::new(NdArray::zeros(vec![5, 5]));
        assert!(CountPlane::from_dataset(&ds).is_err());
    }

    #[test]
    fn artifact_collects_all_three_flavors() {
        let mut store = ArrayStore::in_memory();
        for f in ['B', 'C', 'U'] {
            store.insert(&format!("{f}/jfc"), sample_plane());
        }
        let art = CutPlaneArtifact::from_store(&store, "jfc").unwrap();
        assert_eq!(art.planes.len(), 3);
        assert_eq!(art.y_cut, ANTI_B_CUT);

        let lines = CutLineArtifact::from_store(&store, "jfc", Axis::Y, DEFAULT_REBIN)
            .unwrap();
        assert_eq!(lines.curves.len(), 3);
        assert_eq!(lines.curves[1].label, "charm jets");
    }
}

//! Rejection-map artifacts: the efficiency heatmap over two log-spaced
//! rejection axes, and iso-efficiency contour polylines.
//!
//! Grids come out of the cache raw; both artifacts apply the monotonic
//! maximization pass before use, so a sparse grid renders as a filled
//! surface. Cells that are still at the sentinel (possible only when the
//! whole grid is empty) are emitted as `null`.

use serde::{Deserialize, Serialize};
use tp_core::{Error, Result};
use tp_perf::{RejRejGrid, SENTINEL};

/// Iso-efficiency levels used when the caller does not override them:
/// 0.10 to 0.60 in steps of 0.05.
pub fn default_levels() -> Vec<f64> {
    (2..13).map(|i| i as f64 * 0.05).collect()
}

/// One iso-efficiency polyline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsoEffLine {
    /// Efficiency level of this line.
    pub level: f64,
    /// X-coordinates of the polyline vertices (rejection units).
    pub x: Vec<f64>,
    /// Y-coordinates of the polyline vertices (rejection units).
    pub y: Vec<f64>,
}

/// Plot-friendly artifact for one cached rejection-rejection grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejMapArtifact {
    /// Tagger the grid belongs to.
    pub tagger: String,
    /// Binning the grid belongs to (e.g. "all").
    pub binning: String,
    /// X-axis label, e.g. `$1/\epsilon_{b}$`.
    pub x_label: String,
    /// Y-axis label.
    pub y_label: String,
    /// Efficiency flavor label for the color scale.
    pub z_label: String,
    /// Log-spaced x-axis rejection values, one per column.
    pub x_values: Vec<f64>,
    /// Log-spaced y-axis rejection values, one per row.
    pub y_values: Vec<f64>,
    /// Maximized efficiency, row-major `[y_idx][x_idx]`; `null` where the
    /// grid never received a sample.
    pub efficiency_grid: Vec<Vec<Option<f64>>>,
    /// Iso-efficiency contour polylines.
    pub contours: Vec<IsoEffLine>,
}

/// Axis label for a rejection axis of the given flavor key.
pub(crate) fn rejection_label(flavor: char) -> String {
    format!("$1/\\epsilon_{{{}}}$", flavor.to_ascii_lowercase())
}

/// Maximize a grid and lay it out row-major `[y][x]` with sentinels as
/// `None`.
pub(crate) fn maximized_rows(grid: &RejRejGrid) -> Vec<Vec<Option<f64>>> {
    let n = grid.n_bins;
    let maxed = grid.maximized();
    (0..n)
        .map(|y| {
            (0..n)
                .map(|x| {
                    let v = maxed[x * n + y];
                    if v == SENTINEL {
                        None
                    } else {
                        Some(v)
                    }
                })
                .collect()
        })
        .collect()
}

impl RejMapArtifact {
    /// Build the artifact from a cached grid.
    pub fn from_grid(
        tagger: &str,
        binning: &str,
        grid: &RejRejGrid,
        levels: &[f64],
    ) -> Result<RejMapArtifact> {
        if grid.n_bins < 2 {
            return Err(Error::Validation(format!(
                "grid needs at least 2 bins per axis to contour, got {}",
                grid.n_bins
            )));
        }
        let x_values = grid.x_values();
        let y_values = grid.y_values();
        let rows = maximized_rows(grid);
        let contours = iso_lines(&x_values, &y_values, &rows, levels);
        Ok(RejMapArtifact {
            tagger: tagger.to_string(),
            binning: binning.to_string(),
            x_label: rejection_label(grid.ordering.x.key()),
            y_label: rejection_label(grid.ordering.y.key()),
            z_label: format!(
                "$\\epsilon_{{{}}}$",
                grid.ordering.z.key().to_ascii_lowercase()
            ),
            x_values,
            y_values,
            efficiency_grid: rows,
            contours,
        })
    }
}

/// Extract iso-lines at each level, skipping levels the surface never
/// crosses.
pub(crate) fn iso_lines(
    x_values: &[f64],
    y_values: &[f64],
    rows: &[Vec<Option<f64>>],
    levels: &[f64],
) -> Vec<IsoEffLine> {
    levels
        .iter()
        .filter_map(|&level| {
            let line = marching_squares(x_values, y_values, rows, level);
            if line.x.is_empty() {
                None
            } else {
                Some(line)
            }
        })
        .collect()
}

/// Simple marching-squares extraction of one iso-line on a regular grid.
///
/// Produces an ordered but not necessarily closed polyline; cells touching
/// a no-data vertex are skipped. Downstream renderers handle open
/// polylines.
fn marching_squares(
    x_values: &[f64],
    y_values: &[f64],
    rows: &[Vec<Option<f64>>],
    level: f64,
) -> IsoEffLine {
    let nx = x_values.len();
    let ny = y_values.len();
    let mut cx = Vec::new();
    let mut cy = Vec::new();

    for yi in 0..ny.saturating_sub(1) {
        for xi in 0..nx.saturating_sub(1) {
            let (Some(v00), Some(v10), Some(v01), Some(v11)) = (
                rows[yi][xi],
                rows[yi][xi + 1],
                rows[yi + 1][xi],
                rows[yi + 1][xi + 1],
            ) else {
                continue;
            };

            let x0 = x_values[xi];
            let x1 = x_values[xi + 1];
            let y0 = y_values[yi];
            let y1 = y_values[yi + 1];

            // bottom edge: v00 -> v10
            if (v00 - level) * (v10 - level) < 0.0 {
                let t = (level - v00) / (v10 - v00);
                cx.push(x0 + t * (x1 - x0));
                cy.push(y0);
            }
            // right edge: v10 -> v11
            if (v10 - level) * (v11 - level) < 0.0 {
                let t = (level - v10) / (v11 - v10);
                cx.push(x1);
                cy.push(y0 + t * (y1 - y0));
            }
            // top edge: v01 -> v11
            if (v01 - level) * (v11 - level) < 0.0 {
                let t = (level - v01) / (v11 - v01);
                cx.push(x0 + t * (x1 - x0));
                cy.push(y1);
            }
            // left edge: v00 -> v01
            if (v00 - level) * (v01 - level) < 0.0 {
                let t = (level - v00) / (v01 - v00);
                cx.push(x0);
                cy.push(y0 + t * (y1 - y0));
            }
        }
    }

    // order vertices by angle around the centroid for a cleaner polyline
    if cx.len() > 2 {
        let mean_x: f64 = cx.iter().sum::<f64>() / cx.len() as f64;
        let mean_y: f64 = cy.iter().sum::<f64>() / cy.len() as f64;
        let mut indices: Vec<usize> = (0..cx.len()).collect();
        indices.sort_by(|&a, &b| {
            let angle_a = (cy[a] - mean_y).atan2(cx[a] - mean_x);
            let angle_b = (cy[b] - mean_y).atan2(cx[b] - mean_x);
            angle_a.partial_cmp(&angle_b).unwrap_or(std::cmp::Ordering::Equal)
        });
        cx = indices.iter().map(|&i| cx[i]).collect();
        cy = indices.iter().map(|&i| cy[i]).collect();
    }

    IsoEffLine { level, x: cx, y: cy }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::FlavorOrdering;
    use tp_perf::RejRejGrid;

    fn diagonal_grid(n: usize) -> RejRejGrid {
        // efficiency falls from the loose corner (0,0) toward high
        // rejections; already monotonic
        let mut data = vec![SENTINEL; n * n];
        for x in 0..n {
            for y in 0..n {
                data[x * n + y] = 1.0 - (x + y) as f64 / (2 * n) as f64;
            }
        }
        RejRejGrid::from_parts(n, 1.0, 200.0, 1.0, 1000.0, FlavorOrdering::buc(), data)
            .unwrap()
    }

    #[test]
    fn artifact_has_axis_values_and_contours() {
        let grid = diagonal_grid(20);
        let art = RejMapArtifact::from_grid("gaia", "all", &grid, &[0.8]).unwrap();
        assert_eq!(art.x_values.len(), 20);
        assert_eq!(art.efficiency_grid.len(), 20);
        assert_eq!(art.x_label, "$1/\\epsilon_{b}$");
        assert_eq!(art.contours.len(), 1);
        assert!(!art.contours[0].x.is_empty());
    }

    #[test]
    fn all_sentinel_grid_builds_without_contours() {
        let n = 5;
        let grid = RejRejGrid::from_parts(
            n,
            1.0,
            200.0,
            1.0,
            1000.0,
            FlavorOrdering::buc(),
            vec![SENTINEL; n * n],
        )
        .unwrap();
        let art =
            RejMapArtifact::from_grid("gaia", "all", &grid, &default_levels()).unwrap();
        assert!(art.contours.is_empty());
        assert!(art
            .efficiency_grid
            .iter()
            .all(|row| row.iter().all(|v| v.is_none())));
    }

    #[test]
    fn default_levels_run_from_tenth_to_sixty_percent() {
        let levels = default_levels();
        assert!((levels[0] - 0.1).abs() < 1e-12);
        assert!((levels.last().unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(levels.len(), 11);
    }

    #[test]
    fn serializes_sentinels_as_null() {
        let n = 2;
        let grid = RejRejGrid::from_parts(
            n,
            1.0,
            10.0,
            1.0,
            10.0,
            FlavorOrdering::buc(),
            vec![SENTINEL; n * n],
        )
        .unwrap();
        let art = RejMapArtifact::from_grid("jfc", "all", &grid, &[]).unwrap();
        let json = serde_json::to_string(&art).unwrap();
        assert!(json.contains("null"));
    }
}

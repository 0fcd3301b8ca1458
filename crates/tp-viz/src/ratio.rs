//! Efficiency-ratio artifacts between two taggers on the same rejection
//! grid: the capped ratio heatmap and equal-efficiency contours, with
//! optional Gaussian smoothing before contouring.

use crate::rejmap::{iso_lines, maximized_rows, rejection_label, IsoEffLine};
use serde::{Deserialize, Serialize};
use tp_core::{Error, Result};
use tp_perf::RejRejGrid;

/// Ratio-map artifact: numerator-tagger efficiency over denominator-tagger
/// efficiency, cell by cell, after maximization of both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioMapArtifact {
    /// Numerator tagger.
    pub num_tagger: String,
    /// Denominator tagger.
    pub denom_tagger: String,
    /// X-axis label.
    pub x_label: String,
    /// Y-axis label.
    pub y_label: String,
    /// Color-scale label, e.g. `$\epsilon_{c}$ ratio (GAIA / JetFitterCharm)`.
    pub z_label: String,
    /// Color-scale cap recorded for the renderer (values are not clipped
    /// in the data).
    pub vmax: f64,
    /// Log-spaced x-axis rejection values.
    pub x_values: Vec<f64>,
    /// Log-spaced y-axis rejection values.
    pub y_values: Vec<f64>,
    /// Efficiency ratio, row-major `[y_idx][x_idx]`; `null` where either
    /// grid has no data.
    pub ratio_grid: Vec<Vec<Option<f64>>>,
    /// Contours of the (optionally smoothed) ratio surface; level 1.0 is
    /// the equal-efficiency line.
    pub eq_contours: Vec<IsoEffLine>,
    /// Iso-efficiency contours of the numerator tagger, for orientation.
    pub num_contours: Vec<IsoEffLine>,
}

impl RatioMapArtifact {
    /// Build the ratio artifact from two cached grids.
    ///
    /// `eq_levels` defaults to `[1.0]` when empty; `smooth_sigma` applies
    /// Gaussian smoothing to the ratio surface before contour extraction
    /// (the heatmap stays unsmoothed).
    #[allow(clippy::too_many_arguments)]
    pub fn from_grids(
        num_tagger: &str,
        denom_tagger: &str,
        num: &RejRejGrid,
        denom: &RejRejGrid,
        vmax: f64,
        eq_levels: &[f64],
        smooth_sigma: Option<f64>,
        num_levels: &[f64],
    ) -> Result<RatioMapArtifact> {
        if num.n_bins != denom.n_bins
            || num.x_min != denom.x_min
            || num.x_max != denom.x_max
            || num.y_min != denom.y_min
            || num.y_max != denom.y_max
        {
            return Err(Error::Validation(format!(
                "grids for {num_tagger} and {denom_tagger} have different binning or extents"
            )));
        }
        if num.ordering != denom.ordering {
            return Err(Error::Validation(format!(
                "grids for {num_tagger} and {denom_tagger} have different flavor orderings"
            )));
        }

        let num_rows = maximized_rows(num);
        let denom_rows = maximized_rows(denom);
        let n = num.n_bins;
        let mut ratio: Vec<Vec<Option<f64>>> = vec![vec![None; n]; n];
        for y in 0..n {
            for x in 0..n {
                if let (Some(a), Some(b)) = (num_rows[y][x], denom_rows[y][x]) {
                    if b != 0.0 {
                        ratio[y][x] = Some(a / b);
                    }
                }
            }
        }

        let x_values = num.x_values();
        let y_values = num.y_values();
        let contour_input = match smooth_sigma {
            Some(sigma) if sigma > 0.0 => gaussian_smooth(&ratio, sigma),
            _ => ratio.clone(),
        };
        let eq_levels: Vec<f64> =
            if eq_levels.is_empty() { vec![1.0] } else { eq_levels.to_vec() };
        let eq_contours = iso_lines(&x_values, &y_values, &contour_input, &eq_levels);
        let num_contours = iso_lines(&x_values, &y_values, &num_rows, num_levels);

        Ok(RatioMapArtifact {
            num_tagger: num_tagger.to_string(),
            denom_tagger: denom_tagger.to_string(),
            x_label: rejection_label(num.ordering.x.key()),
            y_label: rejection_label(num.ordering.y.key()),
            z_label: format!(
                "$\\epsilon_{{{}}}$ ratio ({num_tagger} / {denom_tagger})",
                num.ordering.z.key().to_ascii_lowercase()
            ),
            vmax,
            x_values,
            y_values,
            ratio_grid: ratio,
            eq_contours,
            num_contours,
        })
    }
}

/// Separable Gaussian blur over a `[y][x]` surface with no-data holes.
///
/// The kernel is truncated at 4 sigma; no-data cells contribute nothing
/// and keep their hole in the output (weights renormalize over the cells
/// actually present).
pub fn gaussian_smooth(rows: &[Vec<Option<f64>>], sigma: f64) -> Vec<Vec<Option<f64>>> {
    let radius = (4.0 * sigma).ceil() as isize;
    let kernel: Vec<f64> = (-radius..=radius)
        .map(|k| (-0.5 * (k as f64 / sigma).powi(2)).exp())
        .collect();

    let pass = |input: &[Vec<Option<f64>>], along_x: bool| -> Vec<Vec<Option<f64>>> {
        let ny = input.len() as isize;
        let nx = input[0].len() as isize;
        let mut out = vec![vec![None; nx as usize]; ny as usize];
        for y in 0..ny {
            for x in 0..nx {
                if input[y as usize][x as usize].is_none() {
                    continue;
                }
                let mut acc = 0.0;
                let mut norm = 0.0;
                for (ki, w) in kernel.iter().enumerate() {
                    let off = ki as isize - radius;
                    let (sy, sx) = if along_x { (y, x + off) } else { (y + off, x) };
                    if sy < 0 || sy >= ny || sx < 0 || sx >= nx {
                        continue;
                    }
                    if let Some(v) = input[sy as usize][sx as usize] {
                        acc += w * v;
                        norm += w;
                    }
                }
                out[y as usize][x as usize] = Some(acc / norm);
            }
        }
        out
    };

    let first = pass(rows, true);
    pass(&first, false)
}

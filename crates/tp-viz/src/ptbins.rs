//! Rejection vs pT at a fixed b efficiency: per kinematic bin, a 1D
//! working-point lookup on that bin's tagger-output spectra. Bins whose
//! working point fails are logged and emitted as `null`, so one sparse bin
//! never kills the whole curve.

use crate::colors::ColorScheme;
use crate::names;
use serde::{Deserialize, Serialize};
use tp_core::{Flavor, Result};
use tp_perf::{integrate, rejection_at_efficiency};
use tp_store::{schema, ArrayStore};

/// The standard efficiencies these curves are produced at.
pub const STANDARD_EFFS: [f64; 3] = [0.6, 0.7, 0.8];

/// One tagger's rejection-vs-pT curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtBinsCurve {
    /// Internal tagger id.
    pub tagger: String,
    /// Display label.
    pub label: String,
    /// Stable plot color.
    pub color: String,
    /// Bin centers in GeV.
    pub pt_centers: Vec<f64>,
    /// Half bin widths in GeV (x error bars).
    pub pt_half_widths: Vec<f64>,
    /// Rejection per bin; `null` where the working point failed.
    pub rejection: Vec<Option<f64>>,
    /// Statistical error on the rejection, aligned with `rejection`.
    pub rejection_err: Vec<Option<f64>>,
}

/// Rejection-vs-pT artifact at one fixed efficiency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtBinsArtifact {
    /// The fixed b efficiency.
    pub eff: f64,
    /// Which flavor's rejection is plotted.
    pub rejected_flavor: Flavor,
    /// X-axis label.
    pub x_label: String,
    /// Y-axis label, e.g. `$1/\epsilon_{u}$ (fixed $\epsilon_b$ = 0.7)`.
    pub y_label: String,
    /// One curve per tagger.
    pub curves: Vec<PtBinsCurve>,
}

impl PtBinsArtifact {
    /// Build curves for the given taggers from the `btag/ptBins` groups.
    pub fn from_store(
        store: &ArrayStore,
        taggers: &[String],
        eff: f64,
        rejected_flavor: Flavor,
        colors: &mut ColorScheme,
        propaganda: bool,
    ) -> Result<PtBinsArtifact> {
        let eff_group = schema::pt_bin_group(Flavor::B, "btag");
        let rej_group = schema::pt_bin_group(rejected_flavor, "btag");
        let bins = schema::pt_bins(store, &eff_group);

        let mut curves = Vec::new();
        for tagger in taggers {
            let mut rejections = Vec::with_capacity(bins.len());
            let mut errors = Vec::with_capacity(bins.len());
            for bin in &bins {
                let eff_counts = integrate(
                    &store.get(&format!("{}/{}/{}", eff_group, bin.name, tagger))?.array,
                );
                let rej_counts = integrate(
                    &store.get(&format!("{}/{}/{}", rej_group, bin.name, tagger))?.array,
                );
                match rejection_at_efficiency(&eff_counts, &rej_counts, eff) {
                    Ok(rej) => {
                        rejections.push(Some(rej.value));
                        errors.push(Some(rej.stat_error));
                    }
                    Err(err) if err.is_rejection_calc() => {
                        tracing::warn!(tagger = %tagger, bin = %bin.name, %err, "working point failed");
                        rejections.push(None);
                        errors.push(None);
                    }
                    Err(err) => return Err(err),
                }
            }
            let color = colors.get(tagger).to_string();
            curves.push(PtBinsCurve {
                tagger: tagger.clone(),
                label: names::label(tagger, propaganda).to_string(),
                color,
                pt_centers: bins.iter().map(|b| b.center()).collect(),
                pt_half_widths: bins.iter().map(|b| b.half_width()).collect(),
                rejection: rejections,
                rejection_err: errors,
            });
        }
        Ok(PtBinsArtifact {
            eff,
            rejected_flavor,
            x_label: "$p_{\\mathrm{T}}$ [GeV]".to_string(),
            y_label: format!(
                "$1/\\epsilon_{{{}}}$ (fixed $\\epsilon_{{b}}$ = {eff})",
                rejected_flavor.key().to_ascii_lowercase()
            ),
            curves,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::NdArray;
    use tp_store::Dataset;

    fn fill_bin(store: &mut ArrayStore, bin: &str, tagger: &str, b: Vec<f64>, u: Vec<f64>) {
        let n = b.len();
        store.insert(
            &format!("B/btag/ptBins/{bin}/{tagger}"),
            Dataset::new(NdArray::new(vec![n], b).unwrap()),
        );
        store.insert(
            &format!("U/btag/ptBins/{bin}/{tagger}"),
            Dataset::new(NdArray::new(vec![n], u).unwrap()),
        );
    }

    #[test]
    fn failed_bins_become_nulls_not_errors() {
        let mut store = ArrayStore::in_memory();
        // healthy bin: fine binning around the working point
        let b: Vec<f64> = vec![1.0; 200];
        let u: Vec<f64> = (0..200).map(|i| (200 - i) as f64).collect();
        fill_bin(&mut store, "20.0-25.0", "gaia", b, u);
        // broken bin: the rejected flavor vanishes at the working point
        fill_bin(
            &mut store,
            "25.0-30.0",
            "gaia",
            vec![1.0; 10],
            vec![0.0; 10],
        );

        let mut colors = ColorScheme::in_memory();
        let art = PtBinsArtifact::from_store(
            &store,
            &["gaia".to_string()],
            0.7,
            Flavor::U,
            &mut colors,
            false,
        )
        .unwrap();
        let curve = &art.curves[0];
        assert_eq!(curve.pt_centers, vec![22.5, 27.5]);
        assert!(curve.rejection[0].is_some());
        assert!(curve.rejection[1].is_none());
        assert_eq!(curve.rejection.len(), curve.rejection_err.len());
    }

    #[test]
    fn label_carries_the_fixed_efficiency() {
        let store = ArrayStore::in_memory();
        let mut colors = ColorScheme::in_memory();
        let art = PtBinsArtifact::from_store(
            &store,
            &[],
            0.6,
            Flavor::C,
            &mut colors,
            false,
        )
        .unwrap();
        assert!(art.y_label.contains("0.6"));
        assert!(art.y_label.contains("epsilon_{c}"));
    }
}

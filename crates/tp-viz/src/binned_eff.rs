//! Binned pass/fail efficiency cross-check: per flavor, the stored pass
//! and fail pT spectra are combined into an efficiency per configured pT
//! bin, with bin centers and half-widths for error-bar plotting.

use crate::linspace;
use serde::{Deserialize, Serialize};
use tp_core::{Error, Flavor, Result};
use tp_store::{schema, ArrayStore};

/// Default pT bin edges in GeV.
pub const DEFAULT_PT_EDGES_GEV: [f64; 11] =
    [20.0, 25.0, 30.0, 50.0, 80.0, 120.0, 160.0, 200.0, 300.0, 400.0, 750.0];

/// Per-flavor binned efficiency artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinnedEfficiency {
    /// Flavor key.
    pub flavor: char,
    /// Bin centers in MeV (the stored spectra are in MeV).
    pub centers: Vec<f64>,
    /// Half bin widths in MeV.
    pub half_widths: Vec<f64>,
    /// pass / (pass + fail) per bin; `null` where the bin holds no jets.
    pub efficiency: Vec<Option<f64>>,
}

impl BinnedEfficiency {
    /// Build from the `{flavor}/efficiency/pass|fail` spectra.
    ///
    /// The spectra carry flow bins and a `units` attribute that must be
    /// `MeV`; `edges_gev` are converted in here.
    pub fn from_store(
        store: &ArrayStore,
        flavor: Flavor,
        edges_gev: &[f64],
    ) -> Result<BinnedEfficiency> {
        if edges_gev.len() < 2 {
            return Err(Error::Validation("need at least two pT bin edges".into()));
        }
        let pass_ds = store.get(&schema::pass_fail_path(flavor, true))?;
        let fail_ds = store.get(&schema::pass_fail_path(flavor, false))?;
        match pass_ds.attr_str("units") {
            Some("MeV") => {}
            other => {
                return Err(Error::Validation(format!(
                    "pass spectrum units must be MeV, got {other:?}"
                )))
            }
        }
        let mins = pass_ds
            .attr_numbers("min")
            .ok_or_else(|| Error::Validation("pass spectrum lacks 'min' attribute".into()))?;
        let maxes = pass_ds
            .attr_numbers("max")
            .ok_or_else(|| Error::Validation("pass spectrum lacks 'max' attribute".into()))?;

        let n = pass_ds.array.len();
        if pass_ds.array.rank() != 1 || n < 3 || fail_ds.array.len() != n {
            return Err(Error::Validation(format!(
                "pass/fail spectra must be matching 1D histograms with flows, got {} and {}",
                n,
                fail_ds.array.len()
            )));
        }
        let pass = &pass_ds.array.data()[1..n - 1];
        let fail = &fail_ds.array.data()[1..n - 1];
        let x_values = linspace(mins[0], maxes[0], pass.len());

        let mut centers = Vec::new();
        let mut half_widths = Vec::new();
        let mut efficiency = Vec::new();
        for window in edges_gev.windows(2) {
            let (lo, hi) = (window[0] * 1e3, window[1] * 1e3);
            let mut pass_sum = 0.0;
            let mut all_sum = 0.0;
            for ((&x, &p), &f) in x_values.iter().zip(pass).zip(fail) {
                if lo < x && x < hi {
                    pass_sum += p;
                    all_sum += p + f;
                }
            }
            centers.push((lo + hi) / 2.0);
            half_widths.push((hi - lo) / 2.0);
            efficiency.push(if all_sum > 0.0 { Some(pass_sum / all_sum) } else { None });
        }
        Ok(BinnedEfficiency { flavor: flavor.key(), centers, half_widths, efficiency })
    }
}

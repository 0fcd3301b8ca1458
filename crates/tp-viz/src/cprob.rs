//! Overlay curve for a 1D discriminant cut: the (x-rejection, y-rejection)
//! locus swept out by tightening a single cut, with marker points at
//! requested efficiency levels. Drawn on top of the 2D iso-efficiency map
//! to show what a 1D cut gives up.

use serde::{Deserialize, Serialize};
use tp_core::{Error, Flavor, NdArray, Result};
use tp_perf::{efficiency, integrate, rejection};
use tp_store::ArrayStore;

/// Signal efficiencies below this are not worth drawing.
const MIN_SIGNAL_EFF: f64 = 0.2;

/// Marker point at one efficiency level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutOverlayPoint {
    /// Efficiency level the marker annotates.
    pub level: f64,
    /// X-flavor rejection at the first cut reaching that level.
    pub x_rej: f64,
    /// Y-flavor rejection at the same cut.
    pub y_rej: f64,
}

/// The 1D-cut overlay artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutOverlayArtifact {
    /// Display label, e.g. `gaia 1D $p_{c}$`.
    pub label: String,
    /// X-flavor rejection along the cut sweep, loosest to tightest.
    pub x_rej: Vec<f64>,
    /// Y-flavor rejection along the cut sweep.
    pub y_rej: Vec<f64>,
    /// Signal efficiency along the cut sweep.
    pub signal_eff: Vec<f64>,
    /// Markers at the requested efficiency levels.
    pub points: Vec<CutOverlayPoint>,
}

impl CutOverlayArtifact {
    /// Build the overlay from three 1D discriminant histograms stored under
    /// `{flavor}/ctag/all/{discriminant}`.
    ///
    /// `levels` picks the marker efficiencies; levels the curve never
    /// reaches are skipped with a notice.
    pub fn from_store(
        store: &ArrayStore,
        discriminant: &str,
        label: &str,
        levels: &[f64],
    ) -> Result<CutOverlayArtifact> {
        let int = |flavor: Flavor| -> Result<NdArray> {
            let key = format!("{}/ctag/all/{}", flavor.key(), discriminant);
            let ds = store.get(&key)?;
            if ds.array.rank() != 1 {
                return Err(Error::Validation(format!(
                    "overlay needs a 1D histogram at '{key}', got rank {}",
                    ds.array.rank()
                )));
            }
            Ok(integrate(&ds.array))
        };
        let c_int = int(Flavor::C)?;
        let b_rej = rejection(&int(Flavor::B)?);
        let u_rej = rejection(&int(Flavor::U)?);
        let c_eff = efficiency(&c_int)?;

        let mut xs = Vec::new();
        let mut ys = Vec::new();
        let mut effs = Vec::new();
        for ((&e, &br), &ur) in
            c_eff.data().iter().zip(b_rej.data()).zip(u_rej.data())
        {
            if e > MIN_SIGNAL_EFF && br.is_finite() && ur.is_finite() {
                effs.push(e);
                xs.push(br);
                ys.push(ur);
            }
        }

        let mut points = Vec::new();
        for &level in levels {
            match effs.iter().position(|&e| e > level) {
                Some(idx) => {
                    points.push(CutOverlayPoint { level, x_rej: xs[idx], y_rej: ys[idx] })
                }
                None => {
                    tracing::info!(level, discriminant, "cut sweep never reaches level")
                }
            }
        }

        Ok(CutOverlayArtifact {
            label: label.to_string(),
            x_rej: xs,
            y_rej: ys,
            signal_eff: effs,
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_store::Dataset;

    fn fill(store: &mut ArrayStore, flavor: char, counts: Vec<f64>) {
        let n = counts.len();
        let arr = NdArray::new(vec![n], counts).unwrap();
        store.insert(&format!("{flavor}/ctag/all/gaiaC"), Dataset::new(arr));
    }

    fn sample_store() -> ArrayStore {
        let mut store = ArrayStore::in_memory();
        // index 0 = loosest cut; background concentrates at the loose end
        fill(&mut store, 'C', vec![10.0, 20.0, 30.0, 40.0]);
        fill(&mut store, 'B', vec![50.0, 10.0, 4.0, 1.0]);
        fill(&mut store, 'U', vec![80.0, 8.0, 2.0, 1.0]);
        store
    }

    #[test]
    fn sweep_is_filtered_to_useful_efficiencies() {
        let store = sample_store();
        let art =
            CutOverlayArtifact::from_store(&store, "gaiaC", "gaia 1D $p_{c}$", &[0.5])
                .unwrap();
        assert_eq!(art.x_rej.len(), art.signal_eff.len());
        assert!(art.signal_eff.iter().all(|&e| e > MIN_SIGNAL_EFF));
        assert_eq!(art.points.len(), 1);
        assert!(art.points[0].x_rej >= 1.0);
    }

    #[test]
    fn unreachable_levels_are_skipped() {
        let store = sample_store();
        let art = CutOverlayArtifact::from_store(&store, "gaiaC", "gaia", &[2.0]).unwrap();
        assert!(art.points.is_empty());
    }

    #[test]
    fn missing_discriminant_reports_key() {
        let store = ArrayStore::in_memory();
        let err =
            CutOverlayArtifact::from_store(&store, "gaiaC", "gaia", &[]).unwrap_err();
        assert!(err.to_string().contains("ctag/all/gaiaC"));
    }
}

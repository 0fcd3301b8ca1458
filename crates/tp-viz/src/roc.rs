//! b-tagging ROC curves: signal efficiency vs light rejection along a 1D
//! tagger-output sweep, one curve per tagger in the store.

use crate::colors::ColorScheme;
use crate::names;
use serde::{Deserialize, Serialize};
use tp_core::{Flavor, Result};
use tp_perf::integrate;
use tp_store::{schema, ArrayStore};

/// Default minimum efficiency on the x axis.
pub const DEFAULT_MIN_EFF: f64 = 0.5;

/// One tagger's ROC curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocCurve {
    /// Internal tagger id.
    pub tagger: String,
    /// Display label (propaganda name when enabled).
    pub label: String,
    /// Stable plot color from the color scheme.
    pub color: String,
    /// b efficiency, loosest to tightest cut.
    pub eff: Vec<f64>,
    /// Light rejection at the same cuts; infinite-rejection points (zero
    /// light count) are omitted.
    pub rejection: Vec<f64>,
}

/// ROC artifact over all (or a subset of) taggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocArtifact {
    /// X-axis label.
    pub x_label: String,
    /// Y-axis label.
    pub y_label: String,
    /// Lower edge of the plotted efficiency range.
    pub min_eff: f64,
    /// One curve per tagger.
    pub curves: Vec<RocCurve>,
}

impl RocArtifact {
    /// Build ROC curves for the taggers under `B/btag/all`, restricted to
    /// `subset` when given.
    pub fn from_store(
        store: &ArrayStore,
        min_eff: f64,
        subset: Option<&[String]>,
        colors: &mut ColorScheme,
        propaganda: bool,
    ) -> Result<RocArtifact> {
        let mut curves = Vec::new();
        for tagger in schema::taggers(store) {
            if let Some(wanted) = subset {
                if !wanted.iter().any(|t| t == &tagger) {
                    continue;
                }
            }
            let b_int =
                integrate(&store.get(&schema::hist_path(Flavor::B, "btag", "all", &tagger))?.array);
            let u_int =
                integrate(&store.get(&schema::hist_path(Flavor::U, "btag", "all", &tagger))?.array);
            let b_max = b_int.max_value();
            let u_max = u_int.max_value();
            if b_max == 0.0 {
                tracing::warn!(tagger = %tagger, "empty b histogram, skipping ROC curve");
                continue;
            }

            let mut eff = Vec::new();
            let mut rejection = Vec::new();
            for (&b, &u) in b_int.data().iter().zip(u_int.data()) {
                let e = b / b_max;
                if e > min_eff && u != 0.0 {
                    eff.push(e);
                    rejection.push(u_max / u);
                }
            }
            let color = colors.get(&tagger).to_string();
            curves.push(RocCurve {
                label: names::label(&tagger, propaganda).to_string(),
                tagger,
                color,
                eff,
                rejection,
            });
        }
        Ok(RocArtifact {
            x_label: "$\\epsilon_{b}$".to_string(),
            y_label: "$1/\\epsilon_{u}$".to_string(),
            min_eff,
            curves,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::NdArray;
    use tp_store::Dataset;

    fn fill(store: &mut ArrayStore, tagger: &str, b: Vec<f64>, u: Vec<f64>) {
        let n = b.len();
        store.insert(
            &schema::hist_path(Flavor::B, "btag", "all", tagger),
            Dataset::new(NdArray::new(vec![n], b).unwrap()),
        );
        store.insert(
            &schema::hist_path(Flavor::U, "btag", "all", tagger),
            Dataset::new(NdArray::new(vec![n], u).unwrap()),
        );
    }

    fn sample_store() -> ArrayStore {
        let mut store = ArrayStore::in_memory();
        fill(&mut store, "gaia", vec![5.0, 10.0, 25.0, 60.0], vec![90.0, 8.0, 1.5, 0.5]);
        fill(&mut store, "jfc", vec![10.0, 15.0, 30.0, 45.0], vec![70.0, 20.0, 8.0, 2.0]);
        store
    }

    #[test]
    fn one_curve_per_tagger_above_min_eff() {
        let store = sample_store();
        let mut colors = ColorScheme::in_memory();
        let art =
            RocArtifact::from_store(&store, DEFAULT_MIN_EFF, None, &mut colors, false)
                .unwrap();
        assert_eq!(art.curves.len(), 2);
        for curve in &art.curves {
            assert_eq!(curve.eff.len(), curve.rejection.len());
            assert!(curve.eff.iter().all(|&e| e > DEFAULT_MIN_EFF));
            assert!(curve.rejection.iter().all(|r| r.is_finite()));
        }
        // colors are distinct and stable
        assert_ne!(art.curves[0].color, art.curves[1].color);
    }

    #[test]
    fn subset_restricts_the_taggers() {
        let store = sample_store();
        let mut colors = ColorScheme::in_memory();
        let subset = vec!["jfc".to_string()];
        let art =
            RocArtifact::from_store(&store, 0.5, Some(&subset), &mut colors, false)
                .unwrap();
        assert_eq!(art.curves.len(), 1);
        assert_eq!(art.curves[0].tagger, "jfc");
    }

    #[test]
    fn propaganda_mode_uses_display_names() {
        let store = sample_store();
        let mut colors = ColorScheme::in_memory();
        let art = RocArtifact::from_store(&store, 0.5, None, &mut colors, true).unwrap();
        let gaia = art.curves.iter().find(|c| c.tagger == "gaia").unwrap();
        assert_eq!(gaia.label, "GAIA");
    }
}

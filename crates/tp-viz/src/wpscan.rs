//! Constant-b-efficiency scan: charm efficiency vs light rejection per
//! tagger, extracted from the 2D discriminant planes at a fixed b
//! efficiency (default 0.1, i.e. b-rejection 10).

use crate::colors::ColorScheme;
use crate::names;
use serde::{Deserialize, Serialize};
use tp_core::{Flavor, NdArray, Result};
use tp_perf::{efficiency, fixed_background_curve, integrate};
use tp_store::{schema, ArrayStore};

/// One tagger's scan curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WpScanCurve {
    /// Internal tagger id.
    pub tagger: String,
    /// Display label.
    pub label: String,
    /// Stable plot color.
    pub color: String,
    /// Charm efficiency per surviving working point.
    pub signal_eff: Vec<f64>,
    /// Light rejection at the same points; infinite-rejection points are
    /// omitted.
    pub rejection: Vec<f64>,
}

/// The constant-b-efficiency artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WpScanArtifact {
    /// The fixed b efficiency.
    pub background_eff: f64,
    /// Its reciprocal, for the legend title.
    pub background_rejection: f64,
    /// X-axis label.
    pub x_label: String,
    /// Y-axis label.
    pub y_label: String,
    /// One curve per tagger.
    pub curves: Vec<WpScanCurve>,
}

impl WpScanArtifact {
    /// Build scan curves for the given taggers from the `ctag` planes.
    pub fn from_store(
        store: &ArrayStore,
        taggers: &[String],
        b_eff: f64,
        colors: &mut ColorScheme,
        propaganda: bool,
    ) -> Result<WpScanArtifact> {
        let mut curves = Vec::new();
        for tagger in taggers {
            let eff = |flavor: Flavor| -> Result<NdArray> {
                let path = schema::hist_path(flavor, "ctag", "all", tagger);
                efficiency(&integrate(&store.get(&path)?.array))
            };
            let curve = fixed_background_curve(
                &eff(Flavor::C)?,
                &eff(Flavor::B)?,
                &eff(Flavor::U)?,
                b_eff,
            )?;

            let mut signal_eff = Vec::new();
            let mut rejection = Vec::new();
            for (&s, &r) in curve.signal_eff.iter().zip(&curve.rejection) {
                if r.is_finite() {
                    signal_eff.push(s);
                    rejection.push(r);
                }
            }
            let color = colors.get(tagger).to_string();
            curves.push(WpScanCurve {
                tagger: tagger.clone(),
                label: names::label(tagger, propaganda).to_string(),
                color,
                signal_eff,
                rejection,
            });
        }
        Ok(WpScanArtifact {
            background_eff: b_eff,
            background_rejection: 1.0 / b_eff,
            x_label: "$c$ efficiency".to_string(),
            y_label: "light rejection".to_string(),
            curves,
        })
    }
}

//! Fixed-cut efficiency cross-check: for a tagger's discriminant plane and
//! a pair of cut values, the fraction of counts in the region at or above
//! both cuts (snapped to the nearest bin edge), per flavor, with the
//! reciprocal rejection. Used to verify operating points against numbers
//! quoted elsewhere.

use crate::linspace;
use serde::{Deserialize, Serialize};
use tp_core::{Error, Flavor, Result};
use tp_store::{ArrayStore, Dataset};

/// Efficiency and rejection of one flavor at a fixed cut.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutEfficiency {
    /// Flavor key.
    pub flavor: char,
    /// Fraction of counts passing both cuts.
    pub efficiency: f64,
    /// 1 / efficiency; `null` when nothing passes.
    pub rejection: Option<f64>,
}

/// The cross-check artifact for one tagger and cut pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutCheckArtifact {
    /// Tagger checked.
    pub tagger: String,
    /// The requested cut values, one per discriminant axis.
    pub cuts: Vec<f64>,
    /// Per-flavor results, in U, C, B order.
    pub efficiencies: Vec<CutEfficiency>,
}

/// Fraction of the dataset's counts at or above every cut, each cut
/// snapped to its nearest bin edge.
///
/// The array includes flow bins; the edge grid spans the core bins, and
/// the slice from the snapped edge runs to the end of the full array so
/// overflow counts pass any cut.
pub fn cut_efficiency(ds: &Dataset, cuts: &[f64]) -> Result<f64> {
    let shape = ds.array.shape();
    if cuts.len() != shape.len() {
        return Err(Error::Validation(format!(
            "{} cuts given for a rank-{} histogram",
            cuts.len(),
            shape.len()
        )));
    }
    let mins = ds
        .attr_numbers("min")
        .ok_or_else(|| Error::Validation("histogram lacks 'min' attribute".into()))?;
    let maxes = ds
        .attr_numbers("max")
        .ok_or_else(|| Error::Validation("histogram lacks 'max' attribute".into()))?;
    if mins.len() != shape.len() || maxes.len() != shape.len() {
        return Err(Error::Validation(
            "min/max attributes do not match histogram rank".into(),
        ));
    }

    let mut starts = Vec::with_capacity(shape.len());
    for (axis, &cut) in cuts.iter().enumerate() {
        let n_core = shape[axis].checked_sub(2).filter(|&n| n >= 2).ok_or_else(|| {
            Error::Validation(format!(
                "axis {axis} has no core bins (size {})",
                shape[axis]
            ))
        })?;
        let edges = linspace(mins[axis], maxes[axis], n_core);
        let closest = edges
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (*a - cut).abs().total_cmp(&(*b - cut).abs())
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        starts.push(closest);
    }

    let total: f64 = ds.array.data().iter().sum();
    if total == 0.0 {
        return Err(Error::EmptyHistogram);
    }
    let passing = sum_from(&ds.array, &starts);
    Ok(passing / total)
}

/// Sum of all cells whose index is >= `starts` on every axis.
fn sum_from(array: &tp_core::NdArray, starts: &[usize]) -> f64 {
    let shape = array.shape();
    let mut acc = 0.0;
    let mut idx = starts.to_vec();
    'outer: loop {
        let flat: usize = idx
            .iter()
            .enumerate()
            .map(|(axis, &i)| i * array.stride(axis))
            .sum();
        acc += array.data()[flat];
        // odometer increment over the trailing region
        for axis in (0..shape.len()).rev() {
            idx[axis] += 1;
            if idx[axis] < shape[axis] {
                continue 'outer;
            }
            idx[axis] = starts[axis];
        }
        break;
    }
    acc
}

impl CutCheckArtifact {
    /// Run the cross-check for one tagger under `{flavor}/ctag/all/{tagger}`.
    pub fn from_store(
        store: &ArrayStore,
        tagger: &str,
        cuts: &[f64],
    ) -> Result<CutCheckArtifact> {
        let mut efficiencies = Vec::new();
        for flavor in [Flavor::U, Flavor::C, Flavor::B] {
            let ds = store.get(&format!("{}/ctag/all/{}", flavor.key(), tagger))?;
            let efficiency = cut_efficiency(ds, cuts)?;
            let rejection = if efficiency > 0.0 { Some(1.0 / efficiency) } else { None };
            efficiencies.push(CutEfficiency { flavor: flavor.key(), efficiency, rejection });
        }
        Ok(CutCheckArtifact {
            tagger: tagger.to_string(),
            cuts: cuts.to_vec(),
            efficiencies,
        })
    }
}

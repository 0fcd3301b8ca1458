//! Store-layout conventions: where the histogram pipeline puts things and
//! how kinematic bins are named.
//!
//! Keys follow `{flavor}/{category}/{binning}/{tagger}`, with pT-binned
//! histograms under `{flavor}/{category}/ptBins/{low}-{high}/{tagger}` and
//! pass/fail spectra under `{flavor}/efficiency/pass|fail`.

use crate::ArrayStore;
use tp_core::Flavor;

/// Path of a tagger-output histogram.
pub fn hist_path(flavor: Flavor, category: &str, binning: &str, tagger: &str) -> String {
    format!("{}/{}/{}/{}", flavor.key(), category, binning, tagger)
}

/// Path of the pT-bin group for a flavor and category.
pub fn pt_bin_group(flavor: Flavor, category: &str) -> String {
    format!("{}/{}/ptBins", flavor.key(), category)
}

/// Path of a pass/fail pT spectrum.
pub fn pass_fail_path(flavor: Flavor, passing: bool) -> String {
    let leaf = if passing { "pass" } else { "fail" };
    format!("{}/efficiency/{}", flavor.key(), leaf)
}

/// Taggers present in the b-tagging section of the store.
pub fn taggers(store: &ArrayStore) -> Vec<String> {
    store.keys_under("B/btag/all")
}

/// Taggers present in the c-tagging section of the store.
pub fn ctag_taggers(store: &ArrayStore) -> Vec<String> {
    store.keys_under("B/ctag/all")
}

/// One kinematic bin, parsed from a `{low}-{high}` group name.
#[derive(Debug, Clone, PartialEq)]
pub struct PtBin {
    /// The store group name, e.g. `"25.0-30.0"`.
    pub name: String,
    /// Lower edge in GeV.
    pub low: f64,
    /// Upper edge in GeV.
    pub high: f64,
}

impl PtBin {
    /// Bin center.
    pub fn center(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    /// Half the bin width (the x error bar).
    pub fn half_width(&self) -> f64 {
        (self.high - self.low) / 2.0
    }
}

/// Kinematic bins under a pT-bin group, sorted by lower edge. The 0-edge
/// underflow and infinite-edge overflow bins are skipped.
pub fn pt_bins(store: &ArrayStore, group: &str) -> Vec<PtBin> {
    let mut bins: Vec<PtBin> = Vec::new();
    for name in store.keys_under(group) {
        let Some((lowstr, highstr)) = name.split_once('-') else {
            continue;
        };
        let (Ok(low), Ok(high)) = (lowstr.parse::<f64>(), highstr.parse::<f64>()) else {
            continue;
        };
        if low == 0.0 || high.is_infinite() {
            continue;
        }
        bins.push(PtBin { name, low, high });
    }
    bins.sort_by(|a, b| a.low.total_cmp(&b.low));
    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dataset;
    use tp_core::NdArray;

    fn one_d() -> Dataset {
        Dataset::new(NdArray::new(vec![4], vec![1.0, 2.0, 3.0, 4.0]).unwrap())
    }

    #[test]
    fn paths_follow_store_layout() {
        assert_eq!(hist_path(Flavor::B, "ctag", "all", "gaia"), "B/ctag/all/gaia");
        assert_eq!(pt_bin_group(Flavor::U, "btag"), "U/btag/ptBins");
        assert_eq!(pass_fail_path(Flavor::C, true), "C/efficiency/pass");
        assert_eq!(pass_fail_path(Flavor::C, false), "C/efficiency/fail");
    }

    #[test]
    fn pt_bins_skip_flow_bins_and_sort() {
        let mut store = ArrayStore::in_memory();
        for name in ["0.0-20.0", "25.0-30.0", "20.0-25.0", "750.0-inf"] {
            store.insert(&format!("B/btag/ptBins/{name}/gaia"), one_d());
        }
        let bins = pt_bins(&store, "B/btag/ptBins");
        let names: Vec<&str> = bins.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["20.0-25.0", "25.0-30.0"]);
        assert_eq!(bins[0].center(), 22.5);
        assert_eq!(bins[0].half_width(), 2.5);
    }
}

//! Rejection-grid cache over a store file.
//!
//! Grids are expensive to build (millions of placement samples) and cheap
//! to store, so each (tagger, binning) pair is computed once and read many
//! times. First writer wins: a `put` over an existing entry is skipped with
//! a notice, never overwritten. There is no invalidation — delete the cache
//! file to force recomputation.

use crate::convert::{efficiency, rejection};
use crate::integrate::integrate;
use crate::rejrej::{build_grid, GridSpec, RejRejGrid};
use std::path::Path;
use tp_core::{Error, FlavorOrdering, NdArray, Result};
use tp_store::{schema, ArrayStore, AttrValue, Dataset};

/// Cache of built rejection-rejection grids, keyed `{tagger}/{binning}`.
#[derive(Debug, Default)]
pub struct GridCache {
    store: ArrayStore,
}

/// What `build_and_cache` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A fresh grid was built and stored.
    Built,
    /// An entry already existed; recomputation was skipped entirely.
    CachedHit,
}

fn cache_key(tagger: &str, binning: &str) -> String {
    format!("{tagger}/{binning}")
}

impl GridCache {
    /// Open a cache file for read and append, creating it if absent.
    pub fn open(path: &Path) -> Result<GridCache> {
        Ok(GridCache { store: ArrayStore::open_or_create(path)? })
    }

    /// Cache with no backing file, for tests.
    pub fn in_memory() -> GridCache {
        GridCache::default()
    }

    /// Whether a grid exists for this (tagger, binning) pair.
    pub fn has(&self, tagger: &str, binning: &str) -> bool {
        self.store.contains(&cache_key(tagger, binning))
    }

    /// Read a stored grid back, reconstructing extents and flavor ordering
    /// from the dataset attributes. Caches written before minima were
    /// recorded default `x_min`/`y_min` to 1.0.
    pub fn get(&self, tagger: &str, binning: &str) -> Result<RejRejGrid> {
        let key = cache_key(tagger, binning);
        let ds = self.store.get(&key)?;
        let shape = ds.array.shape();
        if shape.len() != 2 || shape[0] != shape[1] {
            return Err(Error::Validation(format!(
                "cached grid '{key}' has shape {shape:?}, expected a square 2D array"
            )));
        }
        let x_max = ds
            .attr_f64("x_max")
            .ok_or_else(|| Error::Validation(format!("cached grid '{key}' lacks x_max")))?;
        let y_max = ds
            .attr_f64("y_max")
            .ok_or_else(|| Error::Validation(format!("cached grid '{key}' lacks y_max")))?;
        let x_min = ds.attr_f64("x_min").unwrap_or(1.0);
        let y_min = ds.attr_f64("y_min").unwrap_or(1.0);
        let ordering = match ds.attr_str("xyz") {
            Some(xyz) => FlavorOrdering::from_key(xyz)?,
            None => {
                tracing::warn!(key = %key, "no stored flavor ordering, assuming BUC");
                FlavorOrdering::buc()
            }
        };
        RejRejGrid::from_parts(
            shape[0],
            x_min,
            x_max,
            y_min,
            y_max,
            ordering,
            ds.array.data().to_vec(),
        )
    }

    /// Store a grid. If an entry already exists it is left untouched and
    /// the skip is reported at info level.
    pub fn put(&mut self, tagger: &str, binning: &str, grid: &RejRejGrid) -> Result<()> {
        if self.has(tagger, binning) {
            tracing::info!(tagger, binning, "using cached grid, skipping store");
            return Ok(());
        }
        let array = NdArray::new(vec![grid.n_bins, grid.n_bins], grid.data().to_vec())?;
        let ds = Dataset::new(array)
            .with_attr("x_min", AttrValue::Number(grid.x_min))
            .with_attr("x_max", AttrValue::Number(grid.x_max))
            .with_attr("y_min", AttrValue::Number(grid.y_min))
            .with_attr("y_max", AttrValue::Number(grid.y_max))
            .with_attr("xyz", AttrValue::Text(grid.ordering.key()));
        self.store.insert(&cache_key(tagger, binning), ds);
        Ok(())
    }

    /// Persist the cache to its backing file.
    pub fn save(&self) -> Result<()> {
        self.store.save()
    }

    /// Taggers with at least one cached grid.
    pub fn taggers(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for key in self.store.keys() {
            if let Some((tagger, _)) = key.split_once('/') {
                if out.last().map(String::as_str) != Some(tagger) {
                    out.push(tagger.to_string());
                }
            }
        }
        out
    }
}

/// Build the rejection-rejection grid for one (tagger, binning) pair from
/// the input histogram store and cache it, or short-circuit on a cache hit.
///
/// Reads the three flavor histograms named by `spec.ordering` under
/// `{flavor}/{category}/{binning}/{tagger}`, integrates them, converts the
/// z flavor to efficiency and x/y flavors to rejection, and re-bins.
pub fn build_and_cache(
    input: &ArrayStore,
    cache: &mut GridCache,
    tagger: &str,
    binning: &str,
    category: &str,
    spec: &GridSpec,
) -> Result<BuildOutcome> {
    if cache.has(tagger, binning) {
        tracing::info!(tagger, binning, "using cached tagger grid");
        return Ok(BuildOutcome::CachedHit);
    }

    let integrated = |flavor| -> Result<NdArray> {
        let path = schema::hist_path(flavor, category, binning, tagger);
        Ok(integrate(&input.get(&path)?.array))
    };
    let eff = efficiency(&integrated(spec.ordering.z)?)?;
    let x_rej = rejection(&integrated(spec.ordering.x)?);
    let y_rej = rejection(&integrated(spec.ordering.y)?);

    tracing::debug!(tagger, binning, samples = eff.len(), "building rejrej grid");
    let grid = build_grid(&eff, &x_rej, &y_rej, spec)?;
    cache.put(tagger, binning, &grid)?;
    Ok(BuildOutcome::Built)
}

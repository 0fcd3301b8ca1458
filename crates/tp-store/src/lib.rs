//! # tp-store
//!
//! A hierarchical namespace of named N-D arrays with attributes, addressed
//! by path-like keys such as `B/ctag/all/gaia`, persisted as a single JSON
//! document. This is the data contract between the upstream histogram
//! pipeline, the rejection-grid cache, and the artifact builders.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod schema;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tp_core::{Error, NdArray, Result};

/// An attribute value attached to a dataset: a scalar, a string, or a
/// per-axis list of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Scalar, e.g. `x_max` on a cached rejection grid.
    Number(f64),
    /// String, e.g. the `xyz` flavor ordering or a `units` tag.
    Text(String),
    /// Per-axis list, e.g. the `min`/`max` bounds of a discriminant plane.
    Numbers(Vec<f64>),
}

/// A named array plus its attribute map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// The array payload.
    pub array: NdArray,
    /// Attributes (`min`, `max`, `x_min` .. `xyz`, `units`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, AttrValue>,
}

impl Dataset {
    /// Dataset with no attributes.
    pub fn new(array: NdArray) -> Dataset {
        Dataset { array, attrs: BTreeMap::new() }
    }

    /// Attach an attribute, builder style.
    pub fn with_attr(mut self, name: &str, value: AttrValue) -> Dataset {
        self.attrs.insert(name.to_string(), value);
        self
    }

    /// Scalar attribute, if present and numeric.
    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        match self.attrs.get(name) {
            Some(AttrValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    /// String attribute, if present.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        match self.attrs.get(name) {
            Some(AttrValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Per-axis list attribute, if present.
    pub fn attr_numbers(&self, name: &str) -> Option<&[f64]> {
        match self.attrs.get(name) {
            Some(AttrValue::Numbers(v)) => Some(v),
            _ => None,
        }
    }
}

/// The store: a flat map from path-like keys to datasets, with the file
/// path it was opened from (if any) for save and diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ArrayStore {
    path: Option<PathBuf>,
    datasets: BTreeMap<String, Dataset>,
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    datasets: BTreeMap<String, Dataset>,
}

impl ArrayStore {
    /// Empty in-memory store (used by tests and as a build target before
    /// the first save).
    pub fn in_memory() -> ArrayStore {
        ArrayStore::default()
    }

    /// Open an existing store file read-only.
    pub fn open(path: &Path) -> Result<ArrayStore> {
        let text = std::fs::read_to_string(path)?;
        let file: StoreFile = serde_json::from_str(&text)?;
        Ok(ArrayStore { path: Some(path.to_path_buf()), datasets: file.datasets })
    }

    /// Open a store file for append, creating an empty one when the file
    /// does not exist yet (the cache-file pattern).
    pub fn open_or_create(path: &Path) -> Result<ArrayStore> {
        if path.exists() {
            ArrayStore::open(path)
        } else {
            tracing::debug!(path = %path.display(), "creating new store");
            Ok(ArrayStore { path: Some(path.to_path_buf()), datasets: BTreeMap::new() })
        }
    }

    /// Persist to the path the store was opened from.
    pub fn save(&self) -> Result<()> {
        let path = self.path.as_ref().ok_or_else(|| {
            Error::Validation("store has no backing path; use save_to".into())
        })?;
        self.save_to(path)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let file = StoreFile { datasets: self.datasets.clone() };
        let text = serde_json::to_string(&file)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// The file path this store is bound to, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether a dataset exists under the given key.
    pub fn contains(&self, key: &str) -> bool {
        self.datasets.contains_key(key)
    }

    /// Fetch a dataset; the error carries the attempted key (and the store
    /// file where known) so batch logs point at the missing input.
    pub fn get(&self, key: &str) -> Result<&Dataset> {
        self.datasets.get(key).ok_or_else(|| {
            let key = match &self.path {
                Some(p) => format!("{} in {}", key, p.display()),
                None => key.to_string(),
            };
            Error::Lookup { key }
        })
    }

    /// Insert a dataset under a key, replacing any previous entry.
    pub fn insert(&mut self, key: &str, dataset: Dataset) {
        self.datasets.insert(key.to_string(), dataset);
    }

    /// Names of the immediate children under a group prefix, in sorted
    /// order. `keys_under("B/ctag/all")` lists the taggers stored there.
    pub fn keys_under(&self, prefix: &str) -> Vec<String> {
        let prefix = format!("{}/", prefix.trim_end_matches('/'));
        let mut out: Vec<String> = Vec::new();
        for key in self.datasets.keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                let child = rest.split('/').next().unwrap_or(rest).to_string();
                if out.last() != Some(&child) {
                    out.push(child);
                }
            }
        }
        out
    }

    /// All dataset keys, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(|k| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let arr = NdArray::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        Dataset::new(arr)
            .with_attr("x_max", AttrValue::Number(200.0))
            .with_attr("xyz", AttrValue::Text("BUC".into()))
            .with_attr("min", AttrValue::Numbers(vec![-7.0, -4.5]))
    }

    #[test]
    fn round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hists.json");

        let mut store = ArrayStore::open_or_create(&path).unwrap();
        store.insert("B/ctag/all/gaia", sample());
        store.save().unwrap();

        let back = ArrayStore::open(&path).unwrap();
        let ds = back.get("B/ctag/all/gaia").unwrap();
        assert_eq!(ds.array.data(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(ds.attr_f64("x_max"), Some(200.0));
        assert_eq!(ds.attr_str("xyz"), Some("BUC"));
        assert_eq!(ds.attr_numbers("min"), Some(&[-7.0, -4.5][..]));
    }

    #[test]
    fn missing_key_reports_the_key() {
        let store = ArrayStore::in_memory();
        let err = store.get("C/ctag/all/jfc").unwrap_err();
        assert!(err.to_string().contains("C/ctag/all/jfc"));
    }

    #[test]
    fn keys_under_lists_children_once() {
        let mut store = ArrayStore::in_memory();
        store.insert("B/ctag/all/gaia", sample());
        store.insert("B/ctag/all/jfc", sample());
        store.insert("B/ctag/ptBins/25.0-30.0/gaia", sample());
        assert_eq!(store.keys_under("B/ctag/all"), vec!["gaia", "jfc"]);
        assert_eq!(store.keys_under("B/ctag"), vec!["all", "ptBins"]);
        assert!(store.keys_under("C/ctag/all").is_empty());
    }
}

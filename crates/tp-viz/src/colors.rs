//! Stable color assignment for taggers across plots, persisted to a small
//! JSON file so colors stay consistent between runs.
//!
//! An explicit object with a load / assign / save lifecycle: load at the
//! start of a rendering session, hand out colors while building artifacts,
//! persist at the end. No process-wide singleton.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tp_core::Result;

/// Palette cycled through for newly seen taggers.
const PALETTE: [&str; 8] = [
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#a65628", "#f781bf",
    "#999999",
];

#[derive(Default, Serialize, Deserialize)]
struct SchemeFile {
    colors: BTreeMap<String, String>,
}

/// Persistent tagger-to-color map.
#[derive(Debug, Default)]
pub struct ColorScheme {
    path: Option<PathBuf>,
    colors: BTreeMap<String, String>,
    dirty: bool,
}

impl ColorScheme {
    /// Load a scheme file, starting empty when the file does not exist.
    pub fn load(path: &Path) -> Result<ColorScheme> {
        let colors = if path.exists() {
            let text = std::fs::read_to_string(path)?;
            let file: SchemeFile = serde_json::from_str(&text)?;
            file.colors
        } else {
            BTreeMap::new()
        };
        Ok(ColorScheme { path: Some(path.to_path_buf()), colors, dirty: false })
    }

    /// Scheme with no backing file, for tests.
    pub fn in_memory() -> ColorScheme {
        ColorScheme::default()
    }

    /// The color for a tagger, assigning the next free palette entry to
    /// taggers seen for the first time.
    pub fn get(&mut self, tagger: &str) -> &str {
        if !self.colors.contains_key(tagger) {
            let used = self.colors.len();
            let color = PALETTE[used % PALETTE.len()].to_string();
            self.colors.insert(tagger.to_string(), color);
            self.dirty = true;
        }
        &self.colors[tagger]
    }

    /// Persist the scheme when anything was assigned since load.
    pub fn save(&mut self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        let file = SchemeFile { colors: self.colors.clone() };
        std::fs::write(&path, serde_json::to_string_pretty(&file)?)?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_are_stable_within_a_session() {
        let mut scheme = ColorScheme::in_memory();
        let first = scheme.get("gaia").to_string();
        scheme.get("jfc");
        assert_eq!(scheme.get("gaia"), first);
        assert_ne!(scheme.get("jfc"), first);
    }

    #[test]
    fn assignments_survive_a_save_load_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colors.json");

        let first = {
            let mut scheme = ColorScheme::load(&path).unwrap();
            let c = scheme.get("gaia").to_string();
            scheme.save().unwrap();
            c
        };
        let mut scheme = ColorScheme::load(&path).unwrap();
        assert_eq!(scheme.get("gaia"), first);
    }

    #[test]
    fn palette_wraps_around() {
        let mut scheme = ColorScheme::in_memory();
        for i in 0..PALETTE.len() {
            scheme.get(&format!("tagger{i}"));
        }
        assert_eq!(scheme.get("one_more"), PALETTE[0]);
    }
}

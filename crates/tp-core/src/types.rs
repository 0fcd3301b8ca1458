//! Shared vocabulary types: jet flavors, flavor-axis orderings, and the
//! flat N-dimensional count array everything operates on.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Jet flavor categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Flavor {
    /// Bottom (the b-tagging background in c-tagging mode).
    B,
    /// Charm (the c-tagging signal).
    C,
    /// Light quarks and gluons.
    U,
    /// Tau.
    T,
}

impl Flavor {
    /// Single-letter store key, e.g. `"B"` in `B/ctag/all/gaia`.
    pub fn key(&self) -> char {
        match self {
            Flavor::B => 'B',
            Flavor::C => 'C',
            Flavor::U => 'U',
            Flavor::T => 'T',
        }
    }

    /// Long human-readable name, used in legend labels.
    pub fn long_name(&self) -> &'static str {
        match self {
            Flavor::B => "bottom",
            Flavor::C => "charm",
            Flavor::U => "light",
            Flavor::T => "tau",
        }
    }

    /// Parse a single-letter flavor key.
    pub fn from_key(c: char) -> Result<Flavor> {
        match c {
            'B' => Ok(Flavor::B),
            'C' => Ok(Flavor::C),
            'U' => Ok(Flavor::U),
            'T' => Ok(Flavor::T),
            other => Err(Error::Validation(format!("unknown flavor key '{other}'"))),
        }
    }
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Which flavor sits on which axis of a rejection-rejection grid:
/// x-rejection flavor, y-rejection flavor, plotted-efficiency flavor.
///
/// Serialized as the 3-character `xyz` attribute (e.g. `"BUC"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorOrdering {
    /// Flavor whose rejection is the x axis.
    pub x: Flavor,
    /// Flavor whose rejection is the y axis.
    pub y: Flavor,
    /// Flavor whose efficiency fills the grid cells.
    pub z: Flavor,
}

impl FlavorOrdering {
    /// The conventional c-tagging layout: b-rejection on x, light-rejection
    /// on y, charm efficiency in the cells.
    pub fn buc() -> FlavorOrdering {
        FlavorOrdering { x: Flavor::B, y: Flavor::U, z: Flavor::C }
    }

    /// The 3-character store attribute, e.g. `"BUC"`.
    pub fn key(&self) -> String {
        format!("{}{}{}", self.x.key(), self.y.key(), self.z.key())
    }

    /// Parse a stored `xyz` attribute.
    pub fn from_key(key: &str) -> Result<FlavorOrdering> {
        let chars: Vec<char> = key.chars().collect();
        if chars.len() != 3 {
            return Err(Error::Validation(format!(
                "flavor ordering key must be 3 characters, got '{key}'"
            )));
        }
        Ok(FlavorOrdering {
            x: Flavor::from_key(chars[0])?,
            y: Flavor::from_key(chars[1])?,
            z: Flavor::from_key(chars[2])?,
        })
    }
}

/// A flat row-major N-dimensional array of float counts.
///
/// Histograms arrive from the upstream pipeline as these; all the numeric
/// transforms (integration, efficiency, rejection) stay in this
/// representation. Explicit shape plus a flat buffer, indexed by strides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdArray {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl NdArray {
    /// Build from a shape and a row-major buffer; the buffer length must be
    /// the product of the dimensions.
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<NdArray> {
        let expect: usize = shape.iter().product();
        if shape.is_empty() || expect != data.len() {
            return Err(Error::Validation(format!(
                "shape {:?} does not describe a buffer of {} elements",
                shape,
                data.len()
            )));
        }
        Ok(NdArray { shape, data })
    }

    /// All-zero array of the given shape.
    pub fn zeros(shape: Vec<usize>) -> NdArray {
        let n = shape.iter().product();
        NdArray { shape, data: vec![0.0; n] }
    }

    /// Dimension sizes.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the array has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat row-major buffer.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable flat buffer.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume into the flat buffer.
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Row-major stride of an axis (product of the dimensions after it).
    pub fn stride(&self, axis: usize) -> usize {
        self.shape[axis + 1..].iter().product()
    }

    /// Largest cell value; 0.0 for an empty buffer.
    pub fn max_value(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max).max(0.0)
    }

    /// Cell value of a rank-2 array at (i, j).
    pub fn at2(&self, i: usize, j: usize) -> f64 {
        debug_assert_eq!(self.rank(), 2);
        self.data[i * self.shape[1] + j]
    }

    /// Reverse the array along one axis, in place.
    pub fn reverse_axis(&mut self, axis: usize) {
        let n = self.shape[axis];
        let inner = self.stride(axis);
        let outer = self.data.len() / (n * inner);
        for o in 0..outer {
            let base = o * n * inner;
            for i in 0..inner {
                let mut lo = 0;
                let mut hi = n - 1;
                while lo < hi {
                    self.data.swap(base + lo * inner + i, base + hi * inner + i);
                    lo += 1;
                    hi -= 1;
                }
            }
        }
    }

    /// Cumulative sum along one axis, in place.
    pub fn cumsum_axis(&mut self, axis: usize) {
        let n = self.shape[axis];
        let inner = self.stride(axis);
        let outer = self.data.len() / (n * inner);
        for o in 0..outer {
            let base = o * n * inner;
            for i in 0..inner {
                for k in 1..n {
                    let prev = self.data[base + (k - 1) * inner + i];
                    self.data[base + k * inner + i] += prev;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_round_trips_through_key() {
        let ord = FlavorOrdering::buc();
        assert_eq!(ord.key(), "BUC");
        assert_eq!(FlavorOrdering::from_key("BUC").unwrap(), ord);
        assert!(FlavorOrdering::from_key("BU").is_err());
        assert!(FlavorOrdering::from_key("BUX").is_err());
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        assert!(NdArray::new(vec![2, 3], vec![0.0; 5]).is_err());
        assert!(NdArray::new(vec![2, 3], vec![0.0; 6]).is_ok());
    }

    #[test]
    fn reverse_axis_rank2() {
        let mut a = NdArray::new(vec![2, 3], vec![1., 2., 3., 4., 5., 6.]).unwrap();
        a.reverse_axis(0);
        assert_eq!(a.data(), &[4., 5., 6., 1., 2., 3.]);
        a.reverse_axis(1);
        assert_eq!(a.data(), &[6., 5., 4., 3., 2., 1.]);
    }

    #[test]
    fn cumsum_axis_rank2() {
        let mut a = NdArray::new(vec![2, 2], vec![1., 2., 3., 4.]).unwrap();
        a.cumsum_axis(0);
        assert_eq!(a.data(), &[1., 2., 4., 6.]);
        let mut b = NdArray::new(vec![2, 2], vec![1., 2., 3., 4.]).unwrap();
        b.cumsum_axis(1);
        assert_eq!(b.data(), &[1., 3., 3., 7.]);
    }

    #[test]
    fn max_of_all_negative_is_clamped_to_zero() {
        // max_value feeds efficiency denominators; counts are never negative
        // so an all-negative buffer only appears in malformed input.
        let a = NdArray::new(vec![2], vec![-3.0, -1.0]).unwrap();
        assert_eq!(a.max_value(), 0.0);
    }
}

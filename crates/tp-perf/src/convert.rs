//! Integrated counts to efficiency and rejection fields.

use tp_core::{Error, NdArray, Result};

/// Efficiency field: integrated counts divided by the array maximum, so
/// values lie in [0, 1].
///
/// An all-zero integrated array has no defined efficiency; that is an
/// [`Error::EmptyHistogram`], never a silent NaN.
pub fn efficiency(integrated: &NdArray) -> Result<NdArray> {
    let max = integrated.max_value();
    if max == 0.0 {
        return Err(Error::EmptyHistogram);
    }
    let mut out = integrated.clone();
    for v in out.data_mut() {
        *v /= max;
    }
    Ok(out)
}

/// Rejection field: array maximum divided by the integrated count, with +∞
/// where the count is exactly zero. Infinity is a valid output — a cut so
/// tight that no background passes has infinite rejection — so zero cells
/// are not an error here.
pub fn rejection(integrated: &NdArray) -> NdArray {
    let max = integrated.max_value();
    let mut out = integrated.clone();
    for v in out.data_mut() {
        *v = if *v != 0.0 { max / *v } else { f64::INFINITY };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn efficiency_is_normalized_to_unity() {
        let int = NdArray::new(vec![4], vec![4.0, 7.0, 9.0, 10.0]).unwrap();
        let eff = efficiency(&int).unwrap();
        assert_relative_eq!(eff.data()[0], 0.4);
        assert_relative_eq!(eff.data()[3], 1.0);
        assert!(eff.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn empty_histogram_is_an_error() {
        let int = NdArray::zeros(vec![3]);
        assert!(matches!(efficiency(&int), Err(Error::EmptyHistogram)));
    }

    #[test]
    fn rejection_is_infinite_exactly_at_zero_counts() {
        // integrated background [[10, 0], [5, 0]]
        let int = NdArray::new(vec![2, 2], vec![10.0, 0.0, 5.0, 0.0]).unwrap();
        let rej = rejection(&int);
        assert_relative_eq!(rej.at2(0, 0), 1.0);
        assert_relative_eq!(rej.at2(1, 0), 2.0);
        assert!(rej.at2(0, 1).is_infinite());
        assert!(rej.at2(1, 1).is_infinite());
        for (r, i) in rej.data().iter().zip(int.data()) {
            assert_eq!(r.is_infinite(), *i == 0.0);
        }
    }
}

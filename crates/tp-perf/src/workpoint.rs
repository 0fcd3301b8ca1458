//! Constant-working-point extraction.
//!
//! Two shapes of the same question. The 2D form scans a discriminant plane
//! row by row at a fixed background efficiency and traces out a
//! signal-efficiency vs other-flavor-rejection curve. The 1D form looks up
//! the rejection of one flavor at a fixed signal efficiency on a single
//! tagger-output spectrum, with roundoff checking.

use tp_core::{Error, NdArray, Result};

/// Relative deviation from the target efficiency that only warrants a
/// warning.
const ROUNDOFF_WARN: f64 = 0.01;
/// Relative deviation that fails the working point outright.
const ROUNDOFF_ERR: f64 = 0.1;

/// A constant-working-point curve: per surviving row, the signal efficiency
/// and the rejection of the other flavor.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingPointCurve {
    /// Signal efficiency per row.
    pub signal_eff: Vec<f64>,
    /// Other-flavor rejection per row; +∞ where the other flavor had zero
    /// efficiency at the working point.
    pub rejection: Vec<f64>,
}

/// Scan a 2D efficiency plane at a fixed background efficiency.
///
/// The background cut runs along axis 1: for each row, the first column
/// whose background efficiency exceeds `target` is the working point (the
/// count of below-threshold columns gives the index directly, background
/// efficiency being monotonic along the axis). Rows that never reach the
/// target clip to the last column. Rows are then discarded when the
/// achieved background efficiency is more than 1% (relative) off target,
/// or when their signal efficiency falls below the running maximum over
/// rows so far (sparse-statistics artifacts).
pub fn fixed_background_curve(
    signal_eff: &NdArray,
    background_eff: &NdArray,
    other_eff: &NdArray,
    target: f64,
) -> Result<WorkingPointCurve> {
    if signal_eff.rank() != 2 {
        return Err(Error::Validation(format!(
            "working-point scan needs rank-2 fields, got rank {}",
            signal_eff.rank()
        )));
    }
    if signal_eff.shape() != background_eff.shape() || signal_eff.shape() != other_eff.shape()
    {
        return Err(Error::Validation(format!(
            "field shapes differ: signal {:?}, background {:?}, other {:?}",
            signal_eff.shape(),
            background_eff.shape(),
            other_eff.shape()
        )));
    }
    if target <= 0.0 || target >= 1.0 {
        return Err(Error::Validation(format!(
            "target background efficiency must be in (0, 1), got {target}"
        )));
    }

    let (n_rows, n_cols) = (signal_eff.shape()[0], signal_eff.shape()[1]);
    let mut curve = WorkingPointCurve { signal_eff: Vec::new(), rejection: Vec::new() };
    let mut best_signal = f64::NEG_INFINITY;
    for row in 0..n_rows {
        let first_passing =
            (0..n_cols).filter(|&col| background_eff.at2(row, col) < target).count();
        let col = first_passing.min(n_cols - 1);

        let achieved = background_eff.at2(row, col);
        if ((achieved - target) / target).abs() > ROUNDOFF_WARN {
            continue;
        }
        let signal = signal_eff.at2(row, col);
        if signal < best_signal {
            continue;
        }
        best_signal = signal;

        let other = other_eff.at2(row, col);
        let rejection = if other != 0.0 { 1.0 / other } else { f64::INFINITY };
        curve.signal_eff.push(signal);
        curve.rejection.push(rejection);
    }
    Ok(curve)
}

/// A rejection value with its statistical error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rejection {
    /// max(count) / count at the working point.
    pub value: f64,
    /// value / sqrt(count): the Poisson error on the rejection.
    pub stat_error: f64,
}

/// Look up the rejection of one flavor at a fixed signal efficiency on 1D
/// integrated spectra.
///
/// `signal_counts` is normalized in here ([`Error::EmptyHistogram`] when
/// all-zero). Fails with [`Error::RejectionCalc`] when no bin reaches the
/// target or the rejected-flavor count at the working point is zero, and
/// with [`Error::Roundoff`] when the achieved efficiency is more than 10%
/// (relative) off target; deviations above 1% only log a warning.
pub fn rejection_at_efficiency(
    signal_counts: &NdArray,
    rejected_counts: &NdArray,
    target: f64,
) -> Result<Rejection> {
    let max = signal_counts.max_value();
    if max == 0.0 {
        return Err(Error::EmptyHistogram);
    }
    let first_above = signal_counts
        .data()
        .iter()
        .position(|&c| c / max > target)
        .ok_or_else(|| {
            Error::RejectionCalc(format!("no bin reaches target efficiency {target}"))
        })?;

    let count = rejected_counts.data()[first_above];
    if count == 0.0 {
        return Err(Error::RejectionCalc("infinite rejection".into()));
    }
    check_round(signal_counts.data()[first_above] / max, target)?;

    let value = rejected_counts.max_value() / count;
    Ok(Rejection { value, stat_error: value / count.sqrt() })
}

fn check_round(achieved: f64, target: f64) -> Result<()> {
    let off_frac = ((target - achieved) / achieved).abs();
    if off_frac > ROUNDOFF_ERR {
        return Err(Error::Roundoff { target, achieved, off_frac: off_frac * 100.0 });
    }
    if off_frac > ROUNDOFF_WARN {
        tracing::warn!(target, achieved, off_percent = off_frac * 100.0, "roundoff at working point");
    }
    Ok(())
}

//! Error types for tagperf

use thiserror::Error;

/// Tagperf error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A requested key does not exist in an array store.
    #[error("lookup failed for key '{key}'")]
    Lookup {
        /// The full path-like key that was requested.
        key: String,
    },

    /// Efficiency requested from an all-zero integrated histogram.
    #[error("empty histogram: integrated counts are all zero")]
    EmptyHistogram,

    /// A working point cannot be achieved (e.g. zero background count at
    /// threshold, or no bin reaches the target efficiency).
    #[error("rejection calculation failed: {0}")]
    RejectionCalc(String),

    /// The achieved working-point efficiency is too far from the target.
    #[error("target eff {target}, rounded to {achieved} ({off_frac:.0}% off)")]
    Roundoff {
        /// Requested efficiency.
        target: f64,
        /// Efficiency actually achieved at the chosen bin.
        achieved: f64,
        /// Relative deviation in percent.
        off_frac: f64,
    },
}

impl Error {
    /// True for working-point failures that are local to one (tagger, bin)
    /// pair. Batch callers catch these, log, and keep going.
    pub fn is_rejection_calc(&self) -> bool {
        matches!(self, Error::RejectionCalc(_) | Error::Roundoff { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_calc_covers_roundoff() {
        let rej = Error::RejectionCalc("infinite rejection".into());
        let round = Error::Roundoff { target: 0.7, achieved: 0.85, off_frac: 21.0 };
        let other = Error::EmptyHistogram;
        assert!(rej.is_rejection_calc());
        assert!(round.is_rejection_calc());
        assert!(!other.is_rejection_calc());
    }

    #[test]
    fn lookup_message_carries_key() {
        let err = Error::Lookup { key: "B/ctag/all/gaia".into() };
        assert!(err.to_string().contains("B/ctag/all/gaia"));
    }
}

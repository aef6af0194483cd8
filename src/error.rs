//! Error types for the scanning surface.
//!
//! A scan either returns a complete profile or fails outright; there are no
//! partial results. Oracle failures are wrapped with the resolution value
//! that triggered them so callers can tell where in the range the engine
//! gave up.

use thiserror::Error;

/// Failure inside the external clustering engine.
///
/// The scanner never retries: the first oracle failure aborts the scan.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct OracleError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl OracleError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Errors returned by [`ProfileScanner::scan`](crate::ProfileScanner::scan).
#[derive(Debug, Error)]
pub enum ScanError {
    /// The input range is a single point; there is nothing to bisect.
    #[error("degenerate resolution range [{lo}, {hi}]")]
    InvalidRange { lo: f64, hi: f64 },

    /// The clustering engine failed at a sampled resolution value.
    #[error("clustering failed at resolution {resolution}")]
    Oracle {
        resolution: f64,
        #[source]
        source: OracleError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_error_carries_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "engine crashed");
        let err = OracleError::with_source("find_partition failed", io);
        assert_eq!(err.to_string(), "find_partition failed");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn invalid_range_display_names_both_bounds() {
        let err = ScanError::InvalidRange { lo: 5.0, hi: 5.0 };
        assert_eq!(err.to_string(), "degenerate resolution range [5, 5]");
    }
}

//! The adaptive bisection scanner.
//!
//! This module implements the worklist-driven loop over resolution
//! sub-intervals:
//! 1. Seed the profile store with both endpoints of the input range.
//! 2. Pop an interval, compare its endpoint summaries, and either finalize
//!    it or sample its midpoint and push both halves.
//! 3. Repair the non-increasing assumption around each new sample.
//! 4. Compress the store into the minimal stepwise profile.
//!
//! The loop uses an explicit stack, so the number of intervals examined is
//! bounded by the stop criteria alone, not by call-stack depth. Everything
//! is sequential and synchronous: each oracle call blocks, and the only way
//! to stop early is to reach the stop criteria.

use crate::error::ScanError;
use crate::span::Span;
use crate::store::{BisectRecord, ProfileStore, StepwiseProfile};
use crate::traits::ResolutionOracle;

/// Stop criteria and subdivision policy for one scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanParams {
    /// Difference in bisect value below which an interval is not subdivided
    /// further. The default of one means a difference of a single unit
    /// (e.g. one edge) does not trigger further bisectioning.
    pub min_diff_bisect: f64,
    /// Difference in resolution below which an interval is not subdivided
    /// further. Measured logarithmically on strictly positive intervals
    /// unless `linear_bisection` is set.
    pub min_diff_resolution: f64,
    /// Force arithmetic subdivision even on strictly positive intervals.
    pub linear_bisection: bool,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            min_diff_bisect: 1.0,
            min_diff_resolution: 1e-3,
            linear_bisection: false,
        }
    }
}

/// Scanner for building a resolution profile of a clustering oracle.
///
/// Typical usage:
/// ```
/// use res_profile::oracles::synthetic::FnOracle;
/// use res_profile::ProfileScanner;
///
/// let oracle = FnOracle::new(|r| 10.0 - r);
/// let scanner = ProfileScanner::new(oracle);
/// let profile = scanner.scan((0.0, 10.0)).expect("range is non-degenerate");
/// assert_eq!(profile.steps()[0].resolution, 0.0);
/// assert_eq!(profile.steps()[0].bisect_value, 10.0);
/// ```
pub struct ProfileScanner<O: ResolutionOracle> {
    oracle: O,
    params: ScanParams,
}

impl<O: ResolutionOracle> ProfileScanner<O> {
    /// Create a scanner with the default stop criteria.
    pub fn new(oracle: O) -> Self {
        Self::with_params(oracle, ScanParams::default())
    }

    /// Create a scanner with explicit stop criteria.
    pub fn with_params(oracle: O, params: ScanParams) -> Self {
        Self { oracle, params }
    }

    /// Expose immutable reference to the underlying oracle.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Return the configured stop criteria.
    pub fn params(&self) -> &ScanParams {
        &self.params
    }

    /// Scan `range`, returning the compressed profile sorted ascending by
    /// resolution.
    ///
    /// Fails with [`ScanError::InvalidRange`] when the range is a single
    /// point, and with [`ScanError::Oracle`] as soon as any oracle call
    /// fails; no partial profile is ever returned.
    pub fn scan(&self, range: (f64, f64)) -> Result<StepwiseProfile<O::Partition>, ScanError> {
        let (lo, hi) = range;
        if lo == hi {
            return Err(ScanError::InvalidRange { lo, hi });
        }

        #[cfg(feature = "tracing")]
        let span = tracing::info_span!("resolution_scan", lo, hi);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let mut store = ProfileStore::new();
        // Both endpoints are recorded unconditionally, even if one of them
        // later turns out to carry no information of its own.
        store.insert(lo, self.evaluate(lo)?);
        store.insert(hi, self.evaluate(hi)?);

        let mut worklist = vec![Span::new(lo, hi)];
        while let Some(current) = worklist.pop() {
            // Endpoints of every pushed span are sampled before the push,
            // so both lookups are infallible here.
            let value_lo = store
                .bisect_value_at(current.lo)
                .expect("span endpoints are sampled before being pushed");
            let value_hi = store
                .bisect_value_at(current.hi)
                .expect("span endpoints are sampled before being pushed");
            let diff_bisect = (value_lo - value_hi).abs();
            let diff_resolution = current.resolution_gap(self.params.linear_bisection);

            #[cfg(feature = "tracing")]
            tracing::info!(
                lo = current.lo,
                hi = current.hi,
                diff_resolution,
                diff_bisect,
                "examined interval"
            );

            if diff_bisect <= self.params.min_diff_bisect
                || diff_resolution <= self.params.min_diff_resolution
            {
                continue;
            }

            let mid = current.midpoint(self.params.linear_bisection);
            worklist.push(Span::new(current.lo, mid));
            worklist.push(Span::new(mid, current.hi));

            // A midpoint can recur exactly (e.g. shared by two sibling
            // spans); deduplication is by exact key, and only an unseen
            // value costs an oracle call. The sub-spans above are pushed
            // either way and re-checked against the stop criteria when
            // popped.
            let (_, inserted) = store.get_or_try_insert_with(mid, || self.evaluate(mid))?;
            if inserted {
                store.enforce_monotonic(mid);
            }
        }

        Ok(store.into_stepwise())
    }

    /// Evaluate the oracle at `resolution`.
    fn evaluate(&self, resolution: f64) -> Result<BisectRecord<O::Partition>, ScanError> {
        let partition = self
            .oracle
            .find_partition(resolution)
            .map_err(|source| ScanError::Oracle { resolution, source })?;
        let bisect_value = self.oracle.bisect_value(&partition);

        #[cfg(feature = "tracing")]
        tracing::info!(resolution, bisect_value, "sampled resolution");

        Ok(BisectRecord {
            partition,
            bisect_value,
        })
    }
}

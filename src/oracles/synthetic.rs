//! Closure-backed oracle with a known bisect value at every resolution.
//!
//! Useful for exercising the scanner without a clustering engine: the
//! "partition" is simply the scalar the closure returns. Deterministic by
//! construction, so scans over it never need monotonicity repair unless the
//! closure itself is non-monotone.

use crate::error::OracleError;
use crate::traits::ResolutionOracle;

/// Oracle whose partition at resolution `r` is `f(r)` itself.
pub struct FnOracle<F> {
    f: F,
}

impl<F> FnOracle<F>
where
    F: Fn(f64) -> f64,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ResolutionOracle for FnOracle<F>
where
    F: Fn(f64) -> f64,
{
    type Partition = f64;

    fn find_partition(&self, resolution: f64) -> Result<f64, OracleError> {
        Ok((self.f)(resolution))
    }

    fn bisect_value(&self, partition: &f64) -> f64 {
        *partition
    }
}

#[cfg(test)]
mod tests {
    use super::FnOracle;
    use crate::traits::ResolutionOracle;

    #[test]
    fn partition_is_the_closure_value() {
        let oracle = FnOracle::new(|r| 2.0 * r + 1.0);
        let partition = oracle.find_partition(3.0).unwrap();
        assert_eq!(partition, 7.0);
        assert_eq!(oracle.bisect_value(&partition), 7.0);
    }
}

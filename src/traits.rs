//! The seam between the scanner and the clustering engine.
//!
//! The scanner does not know how a clustering is computed, how partitions are
//! represented, or how the quality function is evaluated. It only needs two
//! capabilities from the engine, captured by [`ResolutionOracle`]:
//! produce a partition for a fixed resolution value, and summarize a
//! partition as one scalar for comparison across resolutions.
//!
//! Implementations are free to carry whatever configuration the engine needs
//! (graph, method, weights, traversal options); the scanner forwards nothing
//! per call except the resolution value itself.

use crate::error::OracleError;

/// A resolution-parameterized clustering procedure.
///
/// Semantics:
/// - `find_partition(r)` runs the engine at resolution `r` and returns an
///   opaque partition. It may be stochastic (randomized traversal order);
///   the scanner accounts for noise by repairing monotonicity, never by
///   retrying or averaging.
/// - `bisect_value(p)` reduces a partition to the scalar the bisection
///   compares. For the built-in graph oracle this defaults to the total edge
///   weight occurring strictly inside clusters, which is non-increasing in
///   the resolution parameter for the supported quality functions. The value
///   must be finite; non-finite summaries are an unchecked precondition.
///
/// The scanner stores partitions by value and never inspects them, so
/// `Partition` only needs `Clone`. Cheaply cloneable handles (indices,
/// `Arc`-backed state) are fine.
pub trait ResolutionOracle {
    /// Opaque clustering result for one resolution value.
    type Partition: Clone;

    /// Ask the engine for a partition at a fixed resolution.
    ///
    /// A failure here aborts the surrounding scan; no partial profile is
    /// ever surfaced.
    fn find_partition(&self, resolution: f64) -> Result<Self::Partition, OracleError>;

    /// Scalar summary of a partition, used as the bisection signal.
    fn bisect_value(&self, partition: &Self::Partition) -> f64;
}

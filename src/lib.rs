//! Resolution profiles by adaptive bisection
//!
//! This crate characterizes how a resolution-parameterized graph clustering
//! method behaves over a range of resolution values, without exhaustively
//! sampling the parameter space. The result is a compact stepwise mapping
//! from resolution to the clustering that is optimal on that sub-range.
//!
//! ## Core idea
//! 1. Wrap your clustering engine in the [`ResolutionOracle`] trait: produce
//!    a partition for a fixed resolution, and summarize it as one scalar
//!    (the *bisect value*, by default total edge weight inside clusters).
//! 2. Let [`ProfileScanner`] bisect the resolution range adaptively: an
//!    interval is subdivided only while its endpoint summaries differ
//!    enough *and* the interval is wide enough.
//! 3. Read off the compressed [`StepwiseProfile`]: only the resolution
//!    values at which the bisect value actually changes, ascending.
//!
//! Stochastic engines are supported: monotonicity violations caused by
//! noisy runs are repaired locally around each new sample rather than by
//! retrying.
//!
//! ## Quick start
//! ```
//! use res_profile::oracles::synthetic::FnOracle;
//! use res_profile::ProfileScannerBuilder;
//!
//! let oracle = FnOracle::new(|r| 10.0 - r);
//! let scanner = ProfileScannerBuilder::new(oracle)
//!     .min_diff_bisect(2.0)
//!     .linear_bisection(true)
//!     .build();
//! let profile = scanner.scan((0.0, 10.0)).expect("non-degenerate range");
//! assert_eq!(profile.steps()[0].bisect_value, 10.0);
//! let governing = profile.step_at(9.99).expect("inside the range");
//! assert!(governing.bisect_value <= 2.0);
//! ```
//!
//! ## Built-in oracles
//! The `oracles` module contains reference implementations:
//! - Constant Potts model community detection (greedy local moving with
//!   aggregation, randomized traversal, the four classic candidate modes)
//! - A closure-backed synthetic oracle for tests and benchmarks
//!
//! These are both ready to use and templates for wrapping your own engine.

pub mod builder;
pub mod error;
pub mod oracles;
pub mod scanner;
pub mod span;
pub mod store;
pub mod traits;

pub use crate::builder::ProfileScannerBuilder;
pub use crate::error::{OracleError, ScanError};
pub use crate::scanner::{ProfileScanner, ScanParams};
pub use crate::store::{BisectRecord, ProfileStep, ProfileStore, StepwiseProfile};
pub use crate::traits::ResolutionOracle;

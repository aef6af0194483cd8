use crate::scanner::ScanParams;
use crate::{ProfileScanner, ResolutionOracle};

pub struct ProfileScannerBuilder<O: ResolutionOracle> {
    oracle: O,
    params: ScanParams,
}

impl<O: ResolutionOracle> ProfileScannerBuilder<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            params: ScanParams::default(),
        }
    }
    pub fn min_diff_bisect(mut self, value: f64) -> Self {
        self.params.min_diff_bisect = value;
        self
    }
    pub fn min_diff_resolution(mut self, value: f64) -> Self {
        self.params.min_diff_resolution = value;
        self
    }
    pub fn linear_bisection(mut self, linear: bool) -> Self {
        self.params.linear_bisection = linear;
        self
    }
    pub fn build(self) -> ProfileScanner<O> {
        ProfileScanner::with_params(self.oracle, self.params)
    }
}

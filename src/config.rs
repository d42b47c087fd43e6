use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Tunables for one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// A suspect must retain more than this percentage of the whole heap
    pub threshold_percent: f64,
    /// Bound on the accumulation point descent
    pub max_depth: usize,
    /// Descent stops once the biggest child retains less than this fraction
    /// of its dominator
    pub big_drop_ratio: f64,
    /// Reserved, not enforced yet
    pub max_paths: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            threshold_percent: 20.0,
            max_depth: 20,
            big_drop_ratio: 0.5,
            max_paths: 10,
        }
    }
}

impl Config {
    pub fn with_threshold_percent(mut self, threshold_percent: f64) -> Self {
        self.threshold_percent = threshold_percent;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_big_drop_ratio(mut self, big_drop_ratio: f64) -> Self {
        self.big_drop_ratio = big_drop_ratio;
        self
    }

    pub fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.threshold_percent) {
            bail!(
                "threshold_percent must be within [0, 100], got {}",
                self.threshold_percent
            );
        }
        if !(self.big_drop_ratio > 0.0 && self.big_drop_ratio <= 1.0) {
            bail!(
                "big_drop_ratio must be within (0, 1], got {}",
                self.big_drop_ratio
            );
        }
        if self.max_depth == 0 {
            bail!("max_depth must be at least 1");
        }
        Ok(())
    }

    /// Retained size a top dominator has to exceed to become a suspect
    pub fn threshold(&self, total_size: u64) -> f64 {
        self.threshold_percent / 100.0 * total_size as f64
    }
}

//! Per-arm running reward statistics.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::arm::{Arm, validate_arms};
use crate::error::{RbsError, Result};

/// Incremental mean of the rewards observed for one arm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueEstimator {
    count: u64,
    mean: f64,
    initial_estimate: f64,
}

impl ValueEstimator {
    /// Create an estimator that reports `initial_estimate` until the first update.
    #[must_use]
    pub const fn new(initial_estimate: f64) -> Self {
        Self {
            count: 0,
            mean: 0.0,
            initial_estimate,
        }
    }

    pub fn update(&mut self, reward: f64) {
        self.mean += (reward - self.mean) / (self.count + 1) as f64;
        self.count += 1;
    }

    #[must_use]
    pub const fn estimate(&self) -> f64 {
        if self.count == 0 {
            self.initial_estimate
        } else {
            self.mean
        }
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Mean of observed rewards, `None` while unseen.
    #[must_use]
    pub const fn mean(&self) -> Option<f64> {
        if self.count == 0 { None } else { Some(self.mean) }
    }
}

/// Snapshot of one arm's statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmStats {
    pub arm: Arm,
    pub count: u64,
    pub mean: Option<f64>,
}

/// Arms in stable order with one estimator each.
///
/// Shared by the policies as a helper they own, never as shared state.
#[derive(Debug, Clone)]
pub struct EstimatorTable {
    arms: Vec<Arm>,
    estimators: Vec<ValueEstimator>,
    index: HashMap<Arm, usize>,
}

impl EstimatorTable {
    pub fn new(arms: Vec<Arm>, initial_estimate: f64) -> Result<Self> {
        validate_arms(&arms)?;
        let index = arms
            .iter()
            .enumerate()
            .map(|(idx, arm)| (arm.clone(), idx))
            .collect();
        let estimators = vec![ValueEstimator::new(initial_estimate); arms.len()];
        Ok(Self {
            arms,
            estimators,
            index,
        })
    }

    #[must_use]
    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    #[must_use]
    pub fn get(&self, arm: &Arm) -> Option<&ValueEstimator> {
        self.index.get(arm).map(|&idx| &self.estimators[idx])
    }

    pub fn update(&mut self, arm: &Arm, reward: f64) -> Result<()> {
        if !reward.is_finite() {
            return Err(RbsError::InvalidArgument(format!(
                "reward for '{arm}' must be finite, got {reward}"
            )));
        }
        let idx = *self
            .index
            .get(arm)
            .ok_or_else(|| RbsError::UnknownArm(arm.to_string()))?;
        self.estimators[idx].update(reward);
        Ok(())
    }

    /// Arm with the highest estimate; the first in stable order wins ties.
    #[must_use]
    pub fn best_arm(&self) -> &Arm {
        let mut best = 0;
        for (idx, estimator) in self.estimators.iter().enumerate().skip(1) {
            if estimator.estimate() > self.estimators[best].estimate() {
                best = idx;
            }
        }
        &self.arms[best]
    }

    #[must_use]
    pub fn all_unseen(&self) -> bool {
        self.estimators.iter().all(|e| e.count() == 0)
    }

    #[must_use]
    pub fn stats(&self) -> Vec<ArmStats> {
        self.arms
            .iter()
            .zip(&self.estimators)
            .map(|(arm, estimator)| ArmStats {
                arm: arm.clone(),
                count: estimator.count(),
                mean: estimator.mean(),
            })
            .collect()
    }
}

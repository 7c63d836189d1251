use rand::Rng;

use super::arm::Arm;
use super::estimator::{ArmStats, EstimatorTable};
use super::policy::{PolicyState, SelectionPolicy};
use crate::error::{RbsError, Result};

/// Epsilon-greedy selection over mean rewards.
///
/// Every `select` draws one uniform value. Below `epsilon` the policy
/// explores with a second draw picking a uniformly random arm; otherwise it
/// exploits the arm with the highest estimate, first arm winning ties.
///
/// Unseen arms report `+inf` by default, so each arm is exploited once in
/// arm order before the learned means take over.
pub struct EpsilonGreedy<R> {
    table: EstimatorTable,
    epsilon: f64,
    rng: R,
    state: PolicyState,
}

impl<R: Rng> EpsilonGreedy<R> {
    pub fn new(arms: Vec<Arm>, epsilon: f64, rng: R) -> Result<Self> {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(RbsError::InvalidArgument(format!(
                "epsilon must be between 0.0 and 1.0, got {epsilon}"
            )));
        }
        Ok(Self {
            table: EstimatorTable::new(arms, f64::INFINITY)?,
            epsilon,
            rng,
            state: PolicyState::Initialized,
        })
    }

    /// Replace the estimate reported by unseen arms.
    ///
    /// Must be called before the first update.
    #[must_use]
    pub fn with_initial_estimate(mut self, initial_estimate: f64) -> Self {
        // The arm list was validated in `new`.
        if let Ok(table) = EstimatorTable::new(self.table.arms().to_vec(), initial_estimate) {
            self.table = table;
        }
        self
    }

    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl<R: Rng + Send> SelectionPolicy for EpsilonGreedy<R> {
    fn name(&self) -> &str {
        "EpsilonGreedy"
    }

    fn arms(&self) -> &[Arm] {
        self.table.arms()
    }

    fn select(&mut self) -> Arm {
        self.state = PolicyState::Running;
        let draw: f64 = self.rng.random();
        if draw < self.epsilon {
            let arms = self.table.arms();
            let idx = self.rng.random_range(0..arms.len());
            return arms[idx].clone();
        }
        self.table.best_arm().clone()
    }

    fn update(&mut self, arm: &Arm, reward: f64) -> Result<()> {
        self.table.update(arm, reward)
    }

    fn state(&self) -> PolicyState {
        self.state
    }

    fn stats(&self) -> Vec<ArmStats> {
        self.table.stats()
    }
}

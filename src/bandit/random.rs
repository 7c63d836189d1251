use rand::Rng;

use super::arm::Arm;
use super::estimator::{ArmStats, EstimatorTable};
use super::policy::{PolicyState, SelectionPolicy};
use crate::error::Result;

/// Uniform random baseline. Rewards are tracked for reporting only.
pub struct RandomChoice<R> {
    table: EstimatorTable,
    rng: R,
    state: PolicyState,
}

impl<R: Rng> RandomChoice<R> {
    pub fn new(arms: Vec<Arm>, rng: R) -> Result<Self> {
        Ok(Self {
            table: EstimatorTable::new(arms, 0.0)?,
            rng,
            state: PolicyState::Initialized,
        })
    }
}

impl<R: Rng + Send> SelectionPolicy for RandomChoice<R> {
    fn name(&self) -> &str {
        "RandomChoice"
    }

    fn arms(&self) -> &[Arm] {
        self.table.arms()
    }

    fn select(&mut self) -> Arm {
        self.state = PolicyState::Running;
        let arms = self.table.arms();
        arms[self.rng.random_range(0..arms.len())].clone()
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

use super::arm::Arm;
use super::estimator::{ArmStats, EstimatorTable};
use super::policy::{PolicyState, SelectionPolicy};
use crate::error::Result;

/// Pure greedy baseline that never explores.
///
/// Unseen arms report `-inf`, so after the first observation the policy only
/// moves between arms it has already tried. With no observations at all it
/// returns the first arm. A good first reward therefore locks it in.
pub struct FairweatherFriend {
    table: EstimatorTable,
    state: PolicyState,
}

impl FairweatherFriend {
    pub fn new(arms: Vec<Arm>) -> Result<Self> {
        Ok(Self {
            table: EstimatorTable::new(arms, f64::NEG_INFINITY)?,
            state: PolicyState::Initialized,
        })
    }
}

impl SelectionPolicy for FairweatherFriend {
    fn name(&self) -> &str {
        "FairweatherFriend"
    }

    fn arms(&self) -> &[Arm] {
        self.table.arms()
    }

    fn select(&mut self) -> Arm {
        self.state = PolicyState::Running;
        if self.table.all_unseen() {
            return self.table.arms()[0].clone();
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

//! The selection policy contract and the policy registry.

use std::fmt;
use std::str::FromStr;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::arm::Arm;
use super::epsilon::EpsilonGreedy;
use super::estimator::ArmStats;
use super::fairweather::FairweatherFriend;
use super::random::RandomChoice;
use crate::error::{RbsError, Result};

/// Lifecycle of a policy instance. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyState {
    Initialized,
    Running,
}

/// A bandit policy: pick an arm, then learn from the reward it produced.
///
/// Implementations own their estimators and random source outright, so two
/// instances never influence each other.
pub trait SelectionPolicy: Send {
    /// Display name used in step records.
    fn name(&self) -> &str;

    /// Arms in the stable order used for tie-breaking.
    fn arms(&self) -> &[Arm];

    fn select(&mut self) -> Arm;

    /// Fails with `UnknownArm` for arms outside the policy's arm set.
    fn update(&mut self, arm: &Arm, reward: f64) -> Result<()>;

    fn state(&self) -> PolicyState;

    fn stats(&self) -> Vec<ArmStats>;
}

/// Policies that can be built by name from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    EpsilonGreedy,
    FairweatherFriend,
    RandomChoice,
}

impl PolicyKind {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::EpsilonGreedy, Self::FairweatherFriend, Self::RandomChoice]
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EpsilonGreedy => "epsilon_greedy",
            Self::FairweatherFriend => "fairweather_friend",
            Self::RandomChoice => "random_choice",
        }
    }

    /// Build one policy over `arms` with its own `StdRng` seeded from `seed`.
    pub fn build(
        self,
        arms: Vec<Arm>,
        epsilon: f64,
        seed: u64,
    ) -> Result<Box<dyn SelectionPolicy>> {
        let rng = StdRng::seed_from_u64(seed);
        let policy: Box<dyn SelectionPolicy> = match self {
            Self::EpsilonGreedy => Box::new(EpsilonGreedy::new(arms, epsilon, rng)?),
            Self::FairweatherFriend => Box::new(FairweatherFriend::new(arms)?),
            Self::RandomChoice => Box::new(RandomChoice::new(arms, rng)?),
        };
        Ok(policy)
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = RbsError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "epsilon_greedy" | "epsilon" => Ok(Self::EpsilonGreedy),
            "fairweather_friend" | "fairweather" => Ok(Self::FairweatherFriend),
            "random_choice" | "random" => Ok(Self::RandomChoice),
            _ => Err(RbsError::InvalidArgument(format!("unknown policy '{s}'"))),
        }
    }
}

/// Fail on the first kind listed twice. Policy names identify records in the
/// result log, so every kind may appear at most once per run.
pub fn ensure_distinct_kinds(kinds: &[PolicyKind]) -> Result<()> {
    for (idx, kind) in kinds.iter().enumerate() {
        if kinds[..idx].contains(kind) {
            return Err(RbsError::InvalidArgument(format!(
                "policy '{kind}' is listed more than once"
            )));
        }
    }
    Ok(())
}

/// Build every requested policy; policy `i` gets seed `seed + i`.
pub fn build_policies(
    kinds: &[PolicyKind],
    arms: &[Arm],
    epsilon: f64,
    seed: u64,
) -> Result<Vec<Box<dyn SelectionPolicy>>> {
    if kinds.is_empty() {
        return Err(RbsError::InvalidArgument(
            "at least one policy is required".to_string(),
        ));
    }
    ensure_distinct_kinds(kinds)?;
    kinds
        .iter()
        .enumerate()
        .map(|(idx, kind)| kind.build(arms.to_vec(), epsilon, seed.wrapping_add(idx as u64)))
        .collect()
}

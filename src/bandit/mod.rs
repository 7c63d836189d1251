//! Bandit policies over a fixed set of restaurant arms.
//!
//! - `EpsilonGreedy`: explores with probability epsilon, otherwise exploits
//! - `FairweatherFriend`: greedy baseline that never explores
//! - `RandomChoice`: uniform baseline

pub mod arm;
pub mod epsilon;
pub mod estimator;
pub mod fairweather;
pub mod policy;
pub mod random;

pub use arm::{Arm, arms, validate_arms};
pub use epsilon::EpsilonGreedy;
pub use estimator::{ArmStats, EstimatorTable, ValueEstimator};
pub use fairweather::FairweatherFriend;
pub use policy::{PolicyKind, PolicyState, SelectionPolicy, build_policies, ensure_distinct_kinds};
pub use random::RandomChoice;

//! Simulation driver, step records and run summaries.

pub mod record;
pub mod runner;
pub mod summary;

use serde::Serialize;

pub use record::{ResultLog, StepRecord};
pub use runner::SimulationLoop;
pub use summary::{PolicySummary, summarize};

use crate::scoring::QuantifierStats;

/// What a finished run hands to reporting.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub steps: usize,
    pub records: usize,
    pub failed_records: usize,
    pub policies: Vec<PolicySummary>,
    pub scoring: QuantifierStats,
}

impl RunReport {
    #[must_use]
    pub fn new(steps: usize, log: &ResultLog, scoring: QuantifierStats) -> Self {
        Self {
            steps,
            records: log.len(),
            failed_records: log.failures().count(),
            policies: summarize(log),
            scoring,
        }
    }

    /// Policy with the highest cumulative reward.
    #[must_use]
    pub fn leader(&self) -> Option<&PolicySummary> {
        self.policies
            .iter()
            .max_by(|a, b| a.cumulative_reward.total_cmp(&b.cumulative_reward))
    }
}

//! Per-policy aggregates computed from a result log.

use std::collections::BTreeMap;

use serde::Serialize;

use super::record::ResultLog;
use crate::bandit::Arm;

/// Aggregate outcome of one policy over a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicySummary {
    pub policy: String,
    pub steps: usize,
    pub successes: usize,
    pub failures: usize,
    pub cumulative_reward: f64,
    /// Mean over successful steps; `None` when every step failed.
    pub mean_reward: Option<f64>,
    pub choices: BTreeMap<Arm, usize>,
    /// Running total after each step. Failed steps repeat the previous total.
    pub cumulative_series: Vec<f64>,
}

impl PolicySummary {
    fn new(policy: &str) -> Self {
        Self {
            policy: policy.to_string(),
            steps: 0,
            successes: 0,
            failures: 0,
            cumulative_reward: 0.0,
            mean_reward: None,
            choices: BTreeMap::new(),
            cumulative_series: Vec::new(),
        }
    }

    /// Share of steps spent on `arm`.
    #[must_use]
    pub fn choice_share(&self, arm: &Arm) -> f64 {
        if self.steps == 0 {
            return 0.0;
        }
        self.choices.get(arm).copied().unwrap_or(0) as f64 / self.steps as f64
    }
}

/// Summaries for every policy, in first-appearance order.
#[must_use]
pub fn summarize(log: &ResultLog) -> Vec<PolicySummary> {
    let mut summaries: Vec<PolicySummary> = Vec::new();
    for record in log {
        let idx = match summaries.iter().position(|s| s.policy == record.policy) {
            Some(idx) => idx,
            None => {
                summaries.push(PolicySummary::new(&record.policy));
                summaries.len() - 1
            }
        };
        let summary = &mut summaries[idx];
        summary.steps += 1;
        *summary.choices.entry(record.arm.clone()).or_default() += 1;
        match record.reward {
            Some(reward) if record.success => {
                summary.successes += 1;
                summary.cumulative_reward += reward;
            }
            _ => summary.failures += 1,
        }
        summary.cumulative_series.push(summary.cumulative_reward);
    }
    for summary in &mut summaries {
        if summary.successes > 0 {
            summary.mean_reward = Some(summary.cumulative_reward / summary.successes as f64);
        }
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::record::StepRecord;

    #[test]
    fn aggregates_rewards_failures_and_choices() {
        let mut log = ResultLog::new();
        log.append(StepRecord::scored(0, "G", Arm::new("A"), "r".into(), 2.0));
        log.append(StepRecord::scored(0, "F", Arm::new("B"), "r".into(), 5.0));
        log.append(StepRecord::failed(1, "G", Arm::new("B"), "r".into(), "down".into()));
        log.append(StepRecord::scored(1, "F", Arm::new("B"), "r".into(), 1.0));
        log.append(StepRecord::scored(2, "G", Arm::new("A"), "r".into(), 4.0));

        let summaries = summarize(&log);
        assert_eq!(summaries.len(), 2);

        let greedy = &summaries[0];
        assert_eq!(greedy.policy, "G");
        assert_eq!(greedy.steps, 3);
        assert_eq!(greedy.failures, 1);
        assert_eq!(greedy.cumulative_reward, 6.0);
        assert_eq!(greedy.mean_reward, Some(3.0));
        assert_eq!(greedy.cumulative_series, vec![2.0, 2.0, 6.0]);
        assert_eq!(greedy.choices[&Arm::new("A")], 2);
        assert!((greedy.choice_share(&Arm::new("B")) - 1.0 / 3.0).abs() < 1e-12);

        let fair = &summaries[1];
        assert_eq!(fair.cumulative_reward, 6.0);
        assert_eq!(fair.choices.len(), 1);
    }

    #[test]
    fn all_failed_policy_has_no_mean() {
        let mut log = ResultLog::new();
        log.append(StepRecord::failed(0, "P", Arm::new("A"), "r".into(), "x".into()));
        let summaries = summarize(&log);
        assert_eq!(summaries[0].mean_reward, None);
        assert_eq!(summaries[0].cumulative_series, vec![0.0]);
    }
}

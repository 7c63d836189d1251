//! The step-by-step simulation driver.

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::record::{ResultLog, StepRecord};
use crate::bandit::SelectionPolicy;
use crate::error::{RbsError, Result};
use crate::reviews::ReviewSampler;
use crate::scoring::RewardQuantifier;

/// Drives policies through `num_steps` select/sample/score/update rounds.
#[derive(Clone)]
pub struct SimulationLoop {
    num_steps: usize,
    progress: Option<ProgressBar>,
}

impl SimulationLoop {
    #[must_use]
    pub const fn new(num_steps: usize) -> Self {
        Self {
            num_steps,
            progress: None,
        }
    }

    /// Tick `bar` once per policy turn.
    #[must_use]
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    #[must_use]
    pub const fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Run every policy for every step, step-major.
    ///
    /// Setup errors (no policies, an arm without reviews) abort before the
    /// first step. A scoring failure only marks that record as failed.
    pub fn run(
        &self,
        policies: &mut [Box<dyn SelectionPolicy>],
        sampler: &mut dyn ReviewSampler,
        quantifier: &RewardQuantifier,
    ) -> Result<ResultLog> {
        validate_setup(policies, &*sampler)?;
        info!(
            policies = policies.len(),
            steps = self.num_steps,
            "starting simulation"
        );

        let mut log = ResultLog::with_capacity(self.num_steps * policies.len());
        for step in 0..self.num_steps {
            for policy in policies.iter_mut() {
                let record = run_step(step, policy.as_mut(), sampler, quantifier)?;
                log.append(record);
                self.tick();
            }
        }

        self.finish(&log);
        Ok(log)
    }

    /// Run each policy on its own rayon worker.
    ///
    /// Every policy samples from its own clone of `sampler`; the quantifier
    /// and its cache are shared. The merged log has the same step-major order
    /// as [`SimulationLoop::run`].
    pub fn run_parallel<S>(
        &self,
        policies: &mut [Box<dyn SelectionPolicy>],
        sampler: &S,
        quantifier: &RewardQuantifier,
    ) -> Result<ResultLog>
    where
        S: ReviewSampler + Clone + Sync,
    {
        validate_setup(policies, sampler)?;
        info!(
            policies = policies.len(),
            steps = self.num_steps,
            "starting parallel simulation"
        );

        let per_policy: Vec<Vec<StepRecord>> = policies
            .par_iter_mut()
            .map(|policy| {
                let mut sampler = sampler.clone();
                let mut records = Vec::with_capacity(self.num_steps);
                for step in 0..self.num_steps {
                    records.push(run_step(step, policy.as_mut(), &mut sampler, quantifier)?);
                    self.tick();
                }
                Ok(records)
            })
            .collect::<Result<_>>()?;

        let mut log = ResultLog::with_capacity(self.num_steps * policies.len());
        let mut streams: Vec<_> = per_policy.into_iter().map(Vec::into_iter).collect();
        for _ in 0..self.num_steps {
            for stream in &mut streams {
                if let Some(record) = stream.next() {
                    log.append(record);
                }
            }
        }

        self.finish(&log);
        Ok(log)
    }

    fn tick(&self) {
        if let Some(bar) = &self.progress {
            bar.inc(1);
        }
    }

    fn finish(&self, log: &ResultLog) {
        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }
        let failed = log.failures().count();
        info!(records = log.len(), failed, "simulation finished");
    }
}

fn validate_setup(policies: &[Box<dyn SelectionPolicy>], sampler: &dyn ReviewSampler) -> Result<()> {
    if policies.is_empty() {
        return Err(RbsError::InvalidArgument(
            "at least one policy is required".to_string(),
        ));
    }
    for (idx, policy) in policies.iter().enumerate() {
        if policies[..idx].iter().any(|p| p.name() == policy.name()) {
            return Err(RbsError::InvalidArgument(format!(
                "two policies share the name '{}'",
                policy.name()
            )));
        }
        sampler.ensure_arms(policy.arms())?;
    }
    Ok(())
}

fn run_step(
    step: usize,
    policy: &mut dyn SelectionPolicy,
    sampler: &mut dyn ReviewSampler,
    quantifier: &RewardQuantifier,
) -> Result<StepRecord> {
    let arm = policy.select();
    let review = sampler.sample(&arm, step)?;
    match quantifier.score(&review) {
        Ok(reward) => {
            policy.update(&arm, reward)?;
            debug!(step, policy = policy.name(), arm = %arm, reward, "step scored");
            Ok(StepRecord::scored(step, policy.name(), arm, review, reward))
        }
        Err(err) => {
            warn!(step, policy = policy.name(), arm = %arm, error = %err, "step failed, skipping update");
            Ok(StepRecord::failed(step, policy.name(), arm, review, err.to_string()))
        }
    }
}

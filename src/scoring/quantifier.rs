//! Review-to-reward conversion through an external scorer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use serde::Serialize;
use tracing::{debug, trace};

use super::ExternalScorer;
use super::cache::{CacheStats, ScoreCache};
use super::prompts::ScoreScale;
use super::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use crate::config::ScoringConfig;
use crate::error::{RbsError, Result};

/// Settings for a [`RewardQuantifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuantifierSettings {
    pub retry: RetryPolicy,
    pub scale: ScoreScale,
    /// Deadline for a single external call.
    pub timeout: Duration,
}

impl Default for QuantifierSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            scale: ScoreScale::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl QuantifierSettings {
    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        Ok(Self {
            retry: RetryPolicy {
                max_attempts: config.max_attempts,
                initial_backoff: config.initial_backoff,
                backoff_multiplier: config.backoff_multiplier,
                max_backoff: config.max_backoff,
            },
            scale: ScoreScale::new(config.scale_min, config.scale_max)?,
            timeout: config.timeout,
        })
    }
}

/// Counters exposed for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuantifierStats {
    pub cache: CacheStats,
    pub external_calls: u64,
    pub failed_calls: u64,
}

/// Turns review text into a validated reward.
///
/// Scores are cached per review text for the lifetime of the instance, so a
/// review is sent to the external scorer at most once after it succeeds.
pub struct RewardQuantifier {
    scorer: Arc<dyn ExternalScorer>,
    settings: QuantifierSettings,
    sleeper: Arc<dyn Sleeper>,
    cache: ScoreCache,
    external_calls: AtomicU64,
    failed_calls: AtomicU64,
}

impl RewardQuantifier {
    pub fn new(scorer: Arc<dyn ExternalScorer>, settings: QuantifierSettings) -> Self {
        Self {
            scorer,
            settings,
            sleeper: Arc::new(ThreadSleeper),
            cache: ScoreCache::new(),
            external_calls: AtomicU64::new(0),
            failed_calls: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub const fn settings(&self) -> &QuantifierSettings {
        &self.settings
    }

    /// Score `text`, consulting the cache first.
    ///
    /// The only error returned is `ScoringUnavailable`.
    pub fn score(&self, text: &str) -> Result<f64> {
        let (score, hit) = self.cache.get_or_try_insert_with(text, || {
            self.settings
                .retry
                .run(self.sleeper.as_ref(), |attempt| self.attempt(text, attempt))
        })?;
        trace!(hit, score, "quantified review");
        Ok(score)
    }

    /// Cached score for `text` without calling out.
    #[must_use]
    pub fn cached(&self, text: &str) -> Option<f64> {
        self.cache.peek(text)
    }

    #[must_use]
    pub fn stats(&self) -> QuantifierStats {
        QuantifierStats {
            cache: self.cache.stats(),
            external_calls: self.external_calls.load(Ordering::Relaxed),
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
        }
    }

    fn attempt(&self, text: &str, attempt: u32) -> Result<f64> {
        self.external_calls.fetch_add(1, Ordering::Relaxed);
        let outcome = self
            .call_with_timeout(text)
            .and_then(|raw| self.settings.scale.parse(&raw));
        if outcome.is_err() {
            self.failed_calls.fetch_add(1, Ordering::Relaxed);
        } else {
            debug!(attempt, scorer = self.scorer.name(), "external score received");
        }
        outcome
    }

    /// Run one external call on a helper thread and abandon it on timeout.
    fn call_with_timeout(&self, text: &str) -> Result<String> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let scorer = Arc::clone(&self.scorer);
        let review = text.to_owned();
        std::thread::Builder::new()
            .name("rbs-scorer".to_string())
            .spawn(move || {
                let _ = tx.send(scorer.score_raw(&review));
            })?;

        match rx.recv_timeout(self.settings.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(RbsError::Timeout(self.settings.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(RbsError::Transport(
                "scorer exited without a response".to_string(),
            )),
        }
    }
}

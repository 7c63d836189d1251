//! Review sampling strategies.

use std::collections::HashMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::corpus::ReviewCorpus;
use crate::bandit::Arm;
use crate::error::{RbsError, Result};

/// Source of review text for a chosen arm.
pub trait ReviewSampler: Send {
    /// Return one review for `arm` at simulation step `step`.
    ///
    /// Fails with `EmptyCorpus` when the arm has no reviews.
    fn sample(&mut self, arm: &Arm, step: usize) -> Result<String>;

    /// Check up front that every arm can be sampled.
    fn ensure_arms(&self, arms: &[Arm]) -> Result<()>;
}

/// Round-robin over each arm's reviews, wrapping once exhausted.
///
/// The visiting order is the corpus order, or a permutation fixed once per
/// arm from a seed when built with [`CyclingSampler::shuffled`].
#[derive(Debug, Clone)]
pub struct CyclingSampler {
    corpus: Arc<ReviewCorpus>,
    orders: HashMap<Arm, Vec<usize>>,
    cursors: HashMap<Arm, usize>,
}

impl CyclingSampler {
    #[must_use]
    pub fn new(corpus: Arc<ReviewCorpus>) -> Self {
        Self {
            corpus,
            orders: HashMap::new(),
            cursors: HashMap::new(),
        }
    }

    #[must_use]
    pub fn shuffled(corpus: Arc<ReviewCorpus>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let orders = corpus
            .arms()
            .iter()
            .map(|arm| {
                let mut order: Vec<usize> = (0..corpus.review_count(arm)).collect();
                order.shuffle(&mut rng);
                (arm.clone(), order)
            })
            .collect();
        Self {
            corpus,
            orders,
            cursors: HashMap::new(),
        }
    }

    /// Rewind every arm to its first review.
    pub fn reset(&mut self) {
        self.cursors.clear();
    }

    #[must_use]
    pub fn corpus(&self) -> &ReviewCorpus {
        &self.corpus
    }
}

impl ReviewSampler for CyclingSampler {
    fn sample(&mut self, arm: &Arm, _step: usize) -> Result<String> {
        let reviews = self.corpus.reviews(arm);
        if reviews.is_empty() {
            return Err(RbsError::EmptyCorpus {
                arm: arm.to_string(),
            });
        }
        let cursor = self.cursors.entry(arm.clone()).or_insert(0);
        let position = *cursor % reviews.len();
        *cursor = position + 1;
        let idx = self
            .orders
            .get(arm)
            .and_then(|order| order.get(position).copied())
            .unwrap_or(position);
        Ok(reviews[idx].clone())
    }

    fn ensure_arms(&self, arms: &[Arm]) -> Result<()> {
        self.corpus.ensure_arms(arms)
    }
}

/// Serves the same review to every caller asking for the same arm at the
/// same step, so policies that agree on an arm see identical text.
///
/// Only the current step's assignments are held; moving to another step
/// drops them.
#[derive(Debug, Clone)]
pub struct SynchronizedSampler<S> {
    inner: S,
    step: Option<usize>,
    served: HashMap<Arm, String>,
}

impl<S: ReviewSampler> SynchronizedSampler<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            step: None,
            served: HashMap::new(),
        }
    }

    /// Forget the current step's assignments.
    pub fn reset(&mut self) {
        self.step = None;
        self.served.clear();
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ReviewSampler> ReviewSampler for SynchronizedSampler<S> {
    fn sample(&mut self, arm: &Arm, step: usize) -> Result<String> {
        if self.step != Some(step) {
            self.served.clear();
            self.step = Some(step);
        }
        if let Some(review) = self.served.get(arm) {
            return Ok(review.clone());
        }
        let review = self.inner.sample(arm, step)?;
        self.served.insert(arm.clone(), review.clone());
        Ok(review)
    }

    fn ensure_arms(&self, arms: &[Arm]) -> Result<()> {
        self.inner.ensure_arms(arms)
    }
}

//! In-memory review corpus keyed by arm.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::bandit::Arm;
use crate::error::{RbsError, Result};

/// Reviews per arm, arms kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ReviewCorpus {
    arms: Vec<Arm>,
    reviews: HashMap<Arm, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ReviewRow {
    #[serde(alias = "Restaurant")]
    restaurant: String,
    #[serde(alias = "Review")]
    review: String,
}

impl ReviewCorpus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append reviews for an arm, registering the arm on first sight.
    pub fn insert<I, S>(&mut self, arm: impl Into<Arm>, reviews: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let arm = arm.into();
        if !self.reviews.contains_key(&arm) {
            self.arms.push(arm.clone());
        }
        let entry = self.reviews.entry(arm).or_default();
        for review in reviews {
            let review = review.into();
            if review.trim().is_empty() {
                continue;
            }
            entry.push(review);
        }
    }

    pub fn push(&mut self, arm: impl Into<Arm>, review: impl Into<String>) {
        self.insert(arm, [review.into()]);
    }

    /// Build from `(arm, review)` pairs; arm order follows first appearance.
    pub fn from_entries<I, A, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (A, S)>,
        A: Into<Arm>,
        S: Into<String>,
    {
        let mut corpus = Self::new();
        for (arm, review) in entries {
            corpus.push(arm, review);
        }
        corpus
    }

    /// Parse either `{"arm": ["review", ...]}` or
    /// `[{"restaurant": "...", "review": "..."}, ...]`. Arms keep file order.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        match value {
            Value::Object(map) => {
                let mut corpus = Self::new();
                for (arm, reviews) in map {
                    let reviews: Vec<String> = serde_json::from_value(reviews)?;
                    corpus.insert(arm, reviews);
                }
                Ok(corpus)
            }
            Value::Array(_) => {
                let rows: Vec<ReviewRow> = serde_json::from_value(value)?;
                Ok(Self::from_entries(
                    rows.into_iter().map(|row| (row.restaurant, row.review)),
                ))
            }
            _ => Err(RbsError::InvalidArgument(
                "review corpus must be a JSON object or array".to_string(),
            )),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            RbsError::Config(format!("read corpus {}: {err}", path.display()))
        })?;
        let corpus = Self::from_json_str(&raw)?;
        debug!(
            path = %path.display(),
            arms = corpus.arms.len(),
            reviews = corpus.total_reviews(),
            "loaded review corpus"
        );
        Ok(corpus)
    }

    #[must_use]
    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    /// Reviews for `arm`; empty when the arm is unknown.
    #[must_use]
    pub fn reviews(&self, arm: &Arm) -> &[String] {
        self.reviews.get(arm).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn review_count(&self, arm: &Arm) -> usize {
        self.reviews(arm).len()
    }

    #[must_use]
    pub fn total_reviews(&self) -> usize {
        self.reviews.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    /// Keep only `keep`, in the order given. Unknown arms are an error.
    pub fn restrict(&self, keep: &[Arm]) -> Result<Self> {
        let mut corpus = Self::new();
        for arm in keep {
            if !self.reviews.contains_key(arm) {
                return Err(RbsError::UnknownArm(arm.to_string()));
            }
            corpus.insert(arm.clone(), self.reviews(arm).iter().cloned());
        }
        Ok(corpus)
    }

    /// Fail with `EmptyCorpus` for the first arm that has no reviews.
    pub fn ensure_arms(&self, arms: &[Arm]) -> Result<()> {
        match arms.iter().find(|arm| self.review_count(arm) == 0) {
            Some(arm) => Err(RbsError::EmptyCorpus {
                arm: arm.to_string(),
            }),
            None => Ok(()),
        }
    }
}

//! Review scoring: the external scorer contract and the caching, retrying
//! quantifier built on top of it.

pub mod cache;
pub mod classifier;
pub mod openrouter;
pub mod prompts;
pub mod quantifier;
pub mod retry;

pub use cache::{CacheKey, CacheStats, ScoreCache};
pub use classifier::ReviewClassifier;
pub use openrouter::{OpenRouterScorer, ScorerSettings};
pub use prompts::{ScoreScale, ScoringMode, render_classify_prompt, render_quantify_prompt};
pub use quantifier::{QuantifierSettings, QuantifierStats, RewardQuantifier};
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};

use crate::error::Result;

/// A service that scores review text.
///
/// Returns the raw response text; parsing and range checks belong to the
/// quantifier. Implementations must be safe to call again with the same text.
pub trait ExternalScorer: Send + Sync {
    fn score_raw(&self, review: &str) -> Result<String>;

    fn name(&self) -> &str {
        "external"
    }
}

/// A chat model that answers one prompt with one reply.
pub trait ChatCompletion: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}

impl<F> ExternalScorer for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn score_raw(&self, review: &str) -> Result<String> {
        self(review)
    }
}

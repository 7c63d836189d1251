//! Good/Bad review classification mapped onto the score scale.

use tracing::debug;

use super::prompts::{ScoreScale, render_classify_prompt};
use super::{ChatCompletion, ExternalScorer};
use crate::error::{RbsError, Result};

/// Asks the model whether a review is "Good" or "Bad".
///
/// "Good" scores the top of the scale and "Bad" the bottom. Any other reply
/// is `MalformedScore`, which the quantifier retries like a garbled number.
pub struct ReviewClassifier<C> {
    chat: C,
    scale: ScoreScale,
}

impl<C: ChatCompletion> ReviewClassifier<C> {
    pub fn new(chat: C, scale: ScoreScale) -> Self {
        Self { chat, scale }
    }

    /// Returns `"Good"` or `"Bad"`.
    pub fn classify(&self, review: &str) -> Result<&'static str> {
        let reply = self.chat.complete(&render_classify_prompt(review))?;
        match reply.trim() {
            "Good" => Ok("Good"),
            "Bad" => Ok("Bad"),
            other => Err(RbsError::MalformedScore(format!(
                "invalid classification returned: {other:?}"
            ))),
        }
    }
}

impl<C: ChatCompletion> ExternalScorer for ReviewClassifier<C> {
    fn score_raw(&self, review: &str) -> Result<String> {
        let label = self.classify(review)?;
        let score = if label == "Good" {
            self.scale.max
        } else {
            self.scale.min
        };
        debug!(label, score, "review classified");
        Ok(score.to_string())
    }

    fn name(&self) -> &str {
        "classifier"
    }
}

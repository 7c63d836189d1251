//! Scoring prompts and the numeric scale they establish.

use serde::{Deserialize, Serialize};

use crate::error::{RbsError, Result};

const QUANTIFY_REVIEW_PROMPT: &str = r#"
Analyze the following restaurant review and assign it a quantitative score from 1 to 100.
A score of 1 represents an extremely negative experience, while a score of 100 represents an overwhelmingly positive one.
Consider the tone, specific details about food quality, service, and ambiance.

The final output must be a single integer number between 1 and 100 and nothing else. Do not add any explanation or surrounding text.

Review:
"{review_text}"

Score:
"#;

const CLASSIFY_REVIEW_PROMPT: &str = r#"
Is the following restaurant review "Good" or "Bad"?
Consider the tone, specific details about food quality, service, and ambiance.

The final output must be the single word "Good" or the single word "Bad" and nothing else.

Review:
"{review_text}"

Classification:
"#;

/// Wrap a review in the scoring prompt.
#[must_use]
pub fn render_quantify_prompt(review: &str) -> String {
    QUANTIFY_REVIEW_PROMPT.replace("{review_text}", review)
}

/// Wrap a review in the Good/Bad classification prompt.
#[must_use]
pub fn render_classify_prompt(review: &str) -> String {
    CLASSIFY_REVIEW_PROMPT.replace("{review_text}", review)
}

/// How the model is asked to judge a review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// A number on the score scale.
    #[default]
    Quantify,
    /// "Good" or "Bad", mapped to the ends of the score scale.
    Classify,
}

impl ScoringMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quantify => "quantify",
            Self::Classify => "classify",
        }
    }
}

impl std::str::FromStr for ScoringMode {
    type Err = RbsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quantify" => Ok(Self::Quantify),
            "classify" => Ok(Self::Classify),
            _ => Err(RbsError::InvalidArgument(format!("unknown scoring mode '{s}'"))),
        }
    }
}

/// Inclusive range a valid score must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreScale {
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreScale {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 100.0,
        }
    }
}

impl ScoreScale {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(RbsError::Config(format!(
                "invalid score scale [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn contains(&self, score: f64) -> bool {
        score.is_finite() && score >= self.min && score <= self.max
    }

    /// Parse a raw scorer response into a score on this scale.
    pub fn parse(&self, raw: &str) -> Result<f64> {
        let trimmed = raw.trim().trim_matches('"').trim();
        let score: f64 = trimmed
            .parse()
            .map_err(|_| RbsError::MalformedScore(format!("not a number: {trimmed:?}")))?;
        if !self.contains(score) {
            return Err(RbsError::MalformedScore(format!(
                "score {score} outside [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_review() {
        let prompt = render_quantify_prompt("The ramen was superb.");
        assert!(prompt.contains("\"The ramen was superb.\""));
        assert!(prompt.contains("between 1 and 100"));
    }

    #[test]
    fn classify_prompt_asks_for_one_word() {
        let prompt = render_classify_prompt("Cold fries.");
        assert!(prompt.contains("\"Cold fries.\""));
        assert!(prompt.contains("single word \"Good\""));
    }

    #[test]
    fn scoring_mode_parses_from_text() {
        assert_eq!("classify".parse::<ScoringMode>().unwrap(), ScoringMode::Classify);
        assert_eq!(" Quantify ".parse::<ScoringMode>().unwrap(), ScoringMode::Quantify);
        assert!("vote".parse::<ScoringMode>().is_err());
        assert_eq!(ScoringMode::default(), ScoringMode::Quantify);
    }

    #[test]
    fn parse_accepts_integers_and_whitespace() {
        let scale = ScoreScale::default();
        assert_eq!(scale.parse(" 87\n").unwrap(), 87.0);
        assert_eq!(scale.parse("\"42\"").unwrap(), 42.0);
        assert_eq!(scale.parse("1").unwrap(), 1.0);
        assert_eq!(scale.parse("100").unwrap(), 100.0);
    }

    #[test]
    fn parse_rejects_out_of_scale_and_garbage() {
        let scale = ScoreScale::default();
        for raw in ["0", "101", "-5", "NaN", "inf", "Score: 80", ""] {
            let err = scale.parse(raw).unwrap_err();
            assert!(matches!(err, RbsError::MalformedScore(_)), "{raw:?} -> {err}");
        }
    }

    #[test]
    fn scale_validation() {
        assert!(ScoreScale::new(0.0, 1.0).is_ok());
        assert!(ScoreScale::new(5.0, 1.0).is_err());
        assert!(ScoreScale::new(f64::NAN, 1.0).is_err());
    }
}

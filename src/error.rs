//! Error types for rbs.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RbsError {
    /// An arm has no reviews to sample from. Fatal at setup.
    #[error("no reviews available for arm '{arm}'")]
    EmptyCorpus { arm: String },

    #[error("unknown arm: {0}")]
    UnknownArm(String),

    #[error("invalid arm set: {0}")]
    InvalidArms(String),

    /// The external scorer exhausted its retry budget.
    #[error("scoring unavailable after {attempts} attempt(s): {last_error}")]
    ScoringUnavailable { attempts: u32, last_error: String },

    #[error("malformed score: {0}")]
    MalformedScore(String),

    #[error("scorer transport error: {0}")]
    Transport(String),

    #[error("scorer call timed out after {0:?}")]
    Timeout(Duration),

    #[error("scorer rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RbsError {
    /// Short machine-readable code used by robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyCorpus { .. } => "empty_corpus",
            Self::UnknownArm(_) => "unknown_arm",
            Self::InvalidArms(_) => "invalid_arms",
            Self::ScoringUnavailable { .. } => "scoring_unavailable",
            Self::MalformedScore(_) => "malformed_score",
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::RateLimited { .. } => "rate_limited",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Config(_) => "config",
            Self::MissingConfig(_) => "missing_config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, RbsError>;

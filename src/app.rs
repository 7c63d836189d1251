use std::sync::Arc;

use crate::config::Config;
use crate::error::{RbsError, Result};
use crate::scoring::{
    ExternalScorer, OpenRouterScorer, QuantifierSettings, ReviewClassifier, RewardQuantifier,
    ScorerSettings, ScoringMode,
};

pub struct AppContext {
    pub config: Config,
    pub robot_mode: bool,
    pub quiet: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        Ok(Self::new(config, cli.robot, cli.quiet, cli.verbose))
    }

    #[must_use]
    pub const fn new(config: Config, robot_mode: bool, quiet: bool, verbosity: u8) -> Self {
        Self {
            config,
            robot_mode,
            quiet,
            verbosity,
        }
    }

    /// Progress bars and other decoration are for humans only.
    #[must_use]
    pub const fn show_progress(&self) -> bool {
        !self.robot_mode && !self.quiet
    }

    /// Read the API key from the environment variable named in config.
    pub fn api_key(&self) -> Result<String> {
        let var = &self.config.scoring.api_key_env;
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(RbsError::MissingConfig(format!(
                "set {var} to the scoring service API key"
            ))),
        }
    }

    /// The configured external scorer wrapped in a caching, retrying quantifier.
    pub fn quantifier(&self) -> Result<RewardQuantifier> {
        let settings = ScorerSettings::from_config(&self.config.scoring, self.api_key()?);
        let client = OpenRouterScorer::new(settings)?;
        let quantifier_settings = QuantifierSettings::from_config(&self.config.scoring)?;
        let scorer: Arc<dyn ExternalScorer> = match self.config.scoring.mode {
            ScoringMode::Quantify => Arc::new(client),
            ScoringMode::Classify => {
                Arc::new(ReviewClassifier::new(client, quantifier_settings.scale))
            }
        };
        tracing::debug!(
            mode = self.config.scoring.mode.as_str(),
            scorer = scorer.name(),
            "scorer ready"
        );
        Ok(RewardQuantifier::new(scorer, quantifier_settings))
    }
}

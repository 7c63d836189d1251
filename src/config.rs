use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bandit::{PolicyKind, ensure_distinct_kinds};
use crate::error::{RbsError, Result};
use crate::scoring::ScoringMode;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Config {
    /// Defaults, then the explicit file (`--config` or `RBS_CONFIG`) or the
    /// global one, then `RBS_*` environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("RBS_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(RbsError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else if let Some(global) = Self::load_global()? {
            config.merge_patch(global);
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML document on top of the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| RbsError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rbs/config.toml"))
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        match Self::global_path() {
            Some(path) => Self::load_patch(&path),
            None => Ok(None),
        }
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| RbsError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| RbsError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.scoring {
            self.scoring.merge(patch);
        }
        if let Some(patch) = patch.simulation {
            self.simulation.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `RBS_*` overrides read through `lookup`.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("RBS_SCORING_ENDPOINT") {
            self.scoring.endpoint = value;
        }
        if let Some(value) = lookup("RBS_SCORING_MODEL") {
            self.scoring.model = value;
        }
        if let Some(value) = lookup("RBS_SCORING_API_KEY_ENV") {
            self.scoring.api_key_env = value;
        }
        if let Some(value) = env_parse::<ScoringMode, _>(&lookup, "RBS_SCORING_MODE")? {
            self.scoring.mode = value;
        }
        if let Some(value) = env_parse::<u32, _>(&lookup, "RBS_SCORING_MAX_ATTEMPTS")? {
            self.scoring.max_attempts = value;
        }
        if let Some(value) = env_parse::<u64, _>(&lookup, "RBS_SCORING_TIMEOUT_SECS")? {
            self.scoring.timeout = Duration::from_secs(value);
        }
        if let Some(value) = env_parse::<usize, _>(&lookup, "RBS_SIM_STEPS")? {
            self.simulation.num_steps = value;
        }
        if let Some(value) = env_parse::<u64, _>(&lookup, "RBS_SIM_SEED")? {
            self.simulation.seed = value;
        }
        if let Some(value) = env_parse::<f64, _>(&lookup, "RBS_SIM_EPSILON")? {
            self.simulation.epsilon = value;
        }
        if let Some(value) = lookup("RBS_SIM_PARALLEL") {
            self.simulation.parallel = parse_bool(&value);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.simulation.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub site_url: String,
    pub app_name: String,
    /// Numeric score or Good/Bad classification.
    #[serde(default)]
    pub mode: ScoringMode,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub initial_backoff: Duration,
    pub backoff_multiplier: f64,
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
    pub scale_min: f64,
    pub scale_max: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: "google/gemini-flash".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            site_url: "https://github.com/rbs-sim/rbs".to_string(),
            app_name: "rbs".to_string(),
            mode: ScoringMode::Quantify,
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
            scale_min: 1.0,
            scale_max: 100.0,
        }
    }
}

impl ScoringConfig {
    fn merge(&mut self, patch: ScoringPatch) {
        if let Some(value) = patch.endpoint {
            self.endpoint = value;
        }
        if let Some(value) = patch.model {
            self.model = value;
        }
        if let Some(value) = patch.api_key_env {
            self.api_key_env = value;
        }
        if let Some(value) = patch.site_url {
            self.site_url = value;
        }
        if let Some(value) = patch.app_name {
            self.app_name = value;
        }
        if let Some(value) = patch.mode {
            self.mode = value;
        }
        if let Some(value) = patch.timeout {
            self.timeout = value;
        }
        if let Some(value) = patch.max_attempts {
            self.max_attempts = value;
        }
        if let Some(value) = patch.initial_backoff {
            self.initial_backoff = value;
        }
        if let Some(value) = patch.backoff_multiplier {
            self.backoff_multiplier = value;
        }
        if let Some(value) = patch.max_backoff {
            self.max_backoff = value;
        }
        if let Some(value) = patch.scale_min {
            self.scale_min = value;
        }
        if let Some(value) = patch.scale_max {
            self.scale_max = value;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(RbsError::Config(
                "scoring.max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(RbsError::Config(format!(
                "scoring.backoff_multiplier must be >= 1, got {}",
                self.backoff_multiplier
            )));
        }
        if !self.scale_min.is_finite()
            || !self.scale_max.is_finite()
            || self.scale_min >= self.scale_max
        {
            return Err(RbsError::Config(format!(
                "scoring scale {}..{} is empty or inverted",
                self.scale_min, self.scale_max
            )));
        }
        if self.timeout.is_zero() {
            return Err(RbsError::Config("scoring.timeout must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub num_steps: usize,
    pub seed: u64,
    pub epsilon: f64,
    pub policies: Vec<PolicyKind>,
    /// Restrict the run to these arms. Empty means every arm in the corpus.
    #[serde(default)]
    pub arms: Vec<String>,
    pub synchronized_reviews: bool,
    pub shuffle_reviews: bool,
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_steps: 100,
            seed: 42,
            epsilon: 0.1,
            policies: PolicyKind::all().to_vec(),
            arms: Vec::new(),
            synchronized_reviews: true,
            shuffle_reviews: false,
            parallel: false,
        }
    }
}

impl SimulationConfig {
    fn merge(&mut self, patch: SimulationPatch) {
        if let Some(value) = patch.num_steps {
            self.num_steps = value;
        }
        if let Some(value) = patch.seed {
            self.seed = value;
        }
        if let Some(value) = patch.epsilon {
            self.epsilon = value;
        }
        if let Some(value) = patch.policies {
            self.policies = value;
        }
        if let Some(value) = patch.arms {
            self.arms = value;
        }
        if let Some(value) = patch.synchronized_reviews {
            self.synchronized_reviews = value;
        }
        if let Some(value) = patch.shuffle_reviews {
            self.shuffle_reviews = value;
        }
        if let Some(value) = patch.parallel {
            self.parallel = value;
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(RbsError::Config(format!(
                "simulation.epsilon must be within [0, 1], got {}",
                self.epsilon
            )));
        }
        if self.policies.is_empty() {
            return Err(RbsError::Config(
                "simulation.policies must name at least one policy".to_string(),
            ));
        }
        ensure_distinct_kinds(&self.policies)
            .map_err(|e| RbsError::Config(format!("simulation.policies: {e}")))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub scoring: Option<ScoringPatch>,
    pub simulation: Option<SimulationPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ScoringPatch {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key_env: Option<String>,
    pub site_url: Option<String>,
    pub app_name: Option<String>,
    pub mode: Option<ScoringMode>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub max_attempts: Option<u32>,
    #[serde(default, with = "humantime_serde")]
    pub initial_backoff: Option<Duration>,
    pub backoff_multiplier: Option<f64>,
    #[serde(default, with = "humantime_serde")]
    pub max_backoff: Option<Duration>,
    pub scale_min: Option<f64>,
    pub scale_max: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SimulationPatch {
    pub num_steps: Option<usize>,
    pub seed: Option<u64>,
    pub epsilon: Option<f64>,
    pub policies: Option<Vec<PolicyKind>>,
    pub arms: Option<Vec<String>>,
    pub synchronized_reviews: Option<bool>,
    pub shuffle_reviews: Option<bool>,
    pub parallel: Option<bool>,
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn env_parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| RbsError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}

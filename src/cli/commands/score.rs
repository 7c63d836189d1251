use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::{RbsError, Result};
use crate::scoring::{CacheKey, ScoringMode};

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Review text to score
    pub text: String,
}

#[derive(Debug, Serialize)]
struct ScoreOutput {
    key: String,
    score: f64,
    model: String,
    mode: ScoringMode,
    external_calls: u64,
}

pub fn run(ctx: &AppContext, args: &ScoreArgs) -> Result<()> {
    if args.text.trim().is_empty() {
        return Err(RbsError::InvalidArgument("review text is empty".to_string()));
    }
    let quantifier = ctx.quantifier()?;
    let score = quantifier.score(&args.text)?;
    let output = ScoreOutput {
        key: CacheKey::for_text(&args.text).as_str().to_string(),
        score,
        model: ctx.config.scoring.model.clone(),
        mode: ctx.config.scoring.mode,
        external_calls: quantifier.stats().external_calls,
    };

    if ctx.robot_mode {
        emit_robot(&robot_ok(output))
    } else {
        let mut layout = HumanLayout::new();
        layout
            .title("Review Score")
            .kv("Score", &format!("{:.1}", output.score))
            .kv("Model", &output.model)
            .kv("Mode", output.mode.as_str())
            .kv("Attempts", &output.external_calls.to_string());
        emit_human(layout);
        Ok(())
    }
}

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::app::AppContext;
use crate::bandit::{PolicyKind, build_policies};
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok, robot_partial};
use crate::config::SimulationConfig;
use crate::error::Result;
use crate::reviews::{CyclingSampler, ReviewCorpus, SynchronizedSampler};
use crate::simulation::{ResultLog, RunReport, SimulationLoop};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Review corpus (JSON object of arm -> reviews, or rows of restaurant/review)
    #[arg(long)]
    pub corpus: PathBuf,

    /// Number of simulation steps
    #[arg(long)]
    pub steps: Option<usize>,

    /// Base seed for policy and shuffle randomness
    #[arg(long)]
    pub seed: Option<u64>,

    /// Exploration rate for epsilon-greedy
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Policies to run (repeatable): epsilon_greedy, fairweather_friend, random_choice
    #[arg(long = "policy")]
    pub policy: Vec<PolicyKind>,

    /// Restrict the run to these arms (repeatable)
    #[arg(long = "arm")]
    pub arm: Vec<String>,

    /// Visit each arm's reviews in a seeded random order
    #[arg(long)]
    pub shuffle: bool,

    /// Run each policy on its own worker thread
    #[arg(long)]
    pub parallel: bool,

    /// Write every step record as JSON lines
    #[arg(long)]
    pub log_out: Option<PathBuf>,
}

impl RunArgs {
    /// Command-line values win over config.
    fn simulation_config(&self, base: &SimulationConfig) -> SimulationConfig {
        let mut sim = base.clone();
        if let Some(steps) = self.steps {
            sim.num_steps = steps;
        }
        if let Some(seed) = self.seed {
            sim.seed = seed;
        }
        if let Some(epsilon) = self.epsilon {
            sim.epsilon = epsilon;
        }
        if !self.policy.is_empty() {
            sim.policies.clone_from(&self.policy);
        }
        if !self.arm.is_empty() {
            sim.arms.clone_from(&self.arm);
        }
        sim.shuffle_reviews |= self.shuffle;
        sim.parallel |= self.parallel;
        sim
    }
}

pub fn run(ctx: &AppContext, args: &RunArgs) -> Result<()> {
    let sim = args.simulation_config(&ctx.config.simulation);

    let mut corpus = ReviewCorpus::load(&args.corpus)?;
    if !sim.arms.is_empty() {
        corpus = corpus.restrict(&crate::bandit::arms(&sim.arms))?;
    }
    let corpus = Arc::new(corpus);
    let arms = corpus.arms().to_vec();
    corpus.ensure_arms(&arms)?;

    let mut policies = build_policies(&sim.policies, &arms, sim.epsilon, sim.seed)?;
    let quantifier = ctx.quantifier()?;

    let sampler = if sim.shuffle_reviews {
        CyclingSampler::shuffled(Arc::clone(&corpus), sim.seed)
    } else {
        CyclingSampler::new(Arc::clone(&corpus))
    };

    let mut simulation = SimulationLoop::new(sim.num_steps);
    if ctx.show_progress() {
        simulation = simulation.with_progress(progress_bar(sim.num_steps * policies.len()));
    }

    let log = if sim.parallel {
        if sim.synchronized_reviews {
            warn!("synchronized reviews are not shared across parallel policies");
        }
        simulation.run_parallel(&mut policies, &sampler, &quantifier)?
    } else if sim.synchronized_reviews {
        let mut sampler = SynchronizedSampler::new(sampler);
        simulation.run(&mut policies, &mut sampler, &quantifier)?
    } else {
        let mut sampler = sampler;
        simulation.run(&mut policies, &mut sampler, &quantifier)?
    };

    if let Some(path) = &args.log_out {
        write_log(&log, path)?;
    }

    let report = RunReport::new(sim.num_steps, &log, quantifier.stats());
    if ctx.robot_mode {
        if report.failed_records > 0 {
            let completed = report.records - report.failed_records;
            let failed = report.failed_records;
            emit_robot(&robot_partial(report, completed, failed))
        } else {
            emit_robot(&robot_ok(report))
        }
    } else {
        emit_human(render_report(&report, &arms_label(&corpus)));
        Ok(())
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message("simulating");
    pb
}

fn write_log(log: &ResultLog, path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    log.write_jsonl(writer)?;
    info!(path = %path.display(), records = log.len(), "wrote step log");
    Ok(())
}

fn arms_label(corpus: &ReviewCorpus) -> String {
    corpus
        .arms()
        .iter()
        .map(|arm| format!("{arm} ({})", corpus.review_count(arm)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_report(report: &RunReport, arms: &str) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout
        .title("Simulation")
        .kv("Arms", arms)
        .kv("Steps", &report.steps.to_string())
        .kv("Records", &report.records.to_string())
        .kv("Failed steps", &report.failed_records.to_string())
        .blank();

    for summary in &report.policies {
        layout
            .section(&summary.policy)
            .kv("Cumulative reward", &format!("{:.2}", summary.cumulative_reward))
            .kv(
                "Mean reward",
                &summary
                    .mean_reward
                    .map_or_else(|| "-".to_string(), |mean| format!("{mean:.2}")),
            )
            .kv(
                "Scored / failed",
                &format!("{} / {}", summary.successes, summary.failures),
            );
        for (arm, count) in &summary.choices {
            layout.bullet(&format!(
                "{arm}: {count} ({:.0}%)",
                summary.choice_share(arm) * 100.0
            ));
        }
        layout.blank();
    }

    let scoring = &report.scoring;
    layout
        .section("Scoring")
        .kv("External calls", &scoring.external_calls.to_string())
        .kv("Failed calls", &scoring.failed_calls.to_string())
        .kv("Cache entries", &scoring.cache.entries.to_string())
        .kv("Cache hit rate", &format!("{:.1}%", scoring.cache.hit_rate() * 100.0));

    if let Some(leader) = report.leader() {
        layout.blank().kv("Leader", &leader.policy);
    }
    layout
}

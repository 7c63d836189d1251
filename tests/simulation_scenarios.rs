use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::Level;

use rbs::assert_log_contains;
use rbs::bandit::{
    Arm, EpsilonGreedy, FairweatherFriend, PolicyKind, SelectionPolicy, arms, build_policies,
};
use rbs::reviews::{CyclingSampler, ReviewCorpus, SynchronizedSampler};
use rbs::scoring::{ExternalScorer, QuantifierSettings, RetryPolicy, RewardQuantifier, ScoreScale};
use rbs::simulation::{ResultLog, RunReport, SimulationLoop, summarize};
use rbs::test_utils::fixtures::{RecordingSleeper, ScriptedScorer, ab_corpus, keyword_scorer};
use rbs::test_utils::logging::capture_logs;
use rbs::{RbsError, Result};

fn unit_quantifier(scorer: Arc<dyn ExternalScorer>) -> RewardQuantifier {
    RewardQuantifier::new(
        scorer,
        QuantifierSettings {
            retry: RetryPolicy::immediate(3),
            scale: ScoreScale::new(0.0, 1.0).unwrap(),
            ..QuantifierSettings::default()
        },
    )
    .with_sleeper(Arc::new(RecordingSleeper::default()))
}

fn fairweather(names: &[&str]) -> Box<dyn SelectionPolicy> {
    Box::new(FairweatherFriend::new(arms(names.iter().copied())).unwrap())
}

fn greedy(names: &[&str]) -> Box<dyn SelectionPolicy> {
    Box::new(EpsilonGreedy::new(arms(names.iter().copied()), 0.0, StdRng::seed_from_u64(5)).unwrap())
}

#[test]
fn fairweather_sticks_with_first_good_arm() {
    let corpus = Arc::new(ab_corpus());
    let quantifier = unit_quantifier(Arc::new(keyword_scorer()));
    let mut policies = vec![fairweather(&["A", "B"])];
    let mut sampler = CyclingSampler::new(Arc::clone(&corpus));

    let log = SimulationLoop::new(4)
        .run(&mut policies, &mut sampler, &quantifier)
        .unwrap();

    assert_eq!(log.len(), 4);
    assert!(log.iter().all(|record| record.arm == Arm::new("A")));
    let summary = &summarize(&log)[0];
    assert_eq!(summary.policy, "FairweatherFriend");
    assert_eq!(summary.cumulative_reward, 4.0);
    assert_eq!(summary.cumulative_series, vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn unscorable_step_is_recorded_and_run_continues() {
    let mut corpus = ReviewCorpus::new();
    corpus.insert("A", ["cursed review", "great review"]);
    let corpus = Arc::new(corpus);
    let scorer = Arc::new(|review: &str| -> Result<String> {
        if review.contains("cursed") {
            Err(RbsError::Transport("503 service unavailable".to_string()))
        } else {
            Ok("1.0".to_string())
        }
    });
    let quantifier = unit_quantifier(scorer);
    let mut policies = vec![fairweather(&["A"])];
    let mut sampler = CyclingSampler::new(corpus);

    let (log, logs) = capture_logs(|| {
        SimulationLoop::new(3)
            .run(&mut policies, &mut sampler, &quantifier)
            .unwrap()
    });

    assert_eq!(log.len(), 3);
    let first = &log.records()[0];
    assert!(!first.success);
    assert_eq!(first.reward, None);
    assert!(
        first
            .error
            .as_deref()
            .is_some_and(|e| e.contains("after 3 attempt"))
    );
    assert!(log.records()[1].success);
    assert_eq!(log.records()[1].reward, Some(1.0));
    assert_eq!(log.failures().count(), 2);

    assert_log_contains!(logs, Level::WARN, "step failed");
    let stats = quantifier.stats();
    assert_eq!(stats.failed_calls, 6);
    assert_eq!(stats.cache.entries, 1);
}

#[test]
fn every_policy_records_every_step() {
    let corpus = Arc::new(ab_corpus());
    let quantifier = unit_quantifier(Arc::new(keyword_scorer()));
    let mut policies = build_policies(PolicyKind::all(), corpus.arms(), 0.2, 7).unwrap();
    let mut sampler = SynchronizedSampler::new(CyclingSampler::new(Arc::clone(&corpus)));

    let log = SimulationLoop::new(20)
        .run(&mut policies, &mut sampler, &quantifier)
        .unwrap();

    assert_eq!(log.len(), 20 * 3);
    assert_eq!(log.failures().count(), 0);
    for name in ["EpsilonGreedy", "FairweatherFriend", "RandomChoice"] {
        assert_eq!(log.for_policy(name).count(), 20);
    }

    let report = RunReport::new(20, &log, quantifier.stats());
    assert_eq!(report.records, 60);
    assert_eq!(report.failed_records, 0);
    assert_eq!(report.policies.len(), 3);
}

#[test]
fn identical_reviews_reach_the_scorer_once() {
    let corpus = Arc::new(ab_corpus());
    let scorer = Arc::new(keyword_scorer());
    let quantifier = unit_quantifier(scorer.clone());
    let mut policies = build_policies(PolicyKind::all(), corpus.arms(), 0.5, 3).unwrap();
    let mut sampler = CyclingSampler::new(Arc::clone(&corpus));

    SimulationLoop::new(30)
        .run(&mut policies, &mut sampler, &quantifier)
        .unwrap();

    let distinct = corpus.total_reviews();
    assert!(scorer.calls() <= distinct);
    assert_eq!(scorer.calls() as u64, quantifier.stats().cache.entries);
    assert!(quantifier.stats().cache.hits > 0);
}

#[test]
fn synchronized_sampler_shows_agreeing_policies_the_same_review() {
    let mut corpus = ReviewCorpus::new();
    corpus.insert("A", ["great one", "great two", "great three"]);
    let corpus = Arc::new(corpus);
    let quantifier = unit_quantifier(Arc::new(keyword_scorer()));

    let mut policies = vec![fairweather(&["A"]), greedy(&["A"])];
    let mut sampler = SynchronizedSampler::new(CyclingSampler::new(Arc::clone(&corpus)));
    let synced = SimulationLoop::new(3)
        .run(&mut policies, &mut sampler, &quantifier)
        .unwrap();
    for pair in synced.records().chunks(2) {
        assert_eq!(pair[0].review, pair[1].review);
    }

    let mut policies = vec![fairweather(&["A"]), greedy(&["A"])];
    let mut sampler = CyclingSampler::new(corpus);
    let shared = SimulationLoop::new(1)
        .run(&mut policies, &mut sampler, &quantifier)
        .unwrap();
    assert_ne!(shared.records()[0].review, shared.records()[1].review);
}

#[test]
fn repeated_policy_kinds_never_reach_the_loop() {
    let corpus = Arc::new(ab_corpus());
    let kinds = [PolicyKind::EpsilonGreedy, PolicyKind::EpsilonGreedy];
    let err = build_policies(&kinds, corpus.arms(), 0.1, 1).err().unwrap();
    assert!(matches!(err, RbsError::InvalidArgument(_)));

    let quantifier = unit_quantifier(Arc::new(keyword_scorer()));
    let mut policies = vec![greedy(&["A", "B"]), greedy(&["A", "B"])];
    let mut sampler = CyclingSampler::new(corpus);
    let err = SimulationLoop::new(10)
        .run(&mut policies, &mut sampler, &quantifier)
        .unwrap_err();
    assert!(matches!(err, RbsError::InvalidArgument(msg) if msg.contains("EpsilonGreedy")));
}

#[test]
fn missing_reviews_abort_before_scoring() {
    let mut corpus = ReviewCorpus::new();
    corpus.insert("A", ["great"]);
    corpus.insert("B", Vec::<String>::new());
    let scorer = Arc::new(ScriptedScorer::fixed("1"));
    let quantifier = unit_quantifier(scorer.clone());
    let mut policies = vec![fairweather(&["A", "B"])];
    let mut sampler = CyclingSampler::new(Arc::new(corpus));

    let err = SimulationLoop::new(5)
        .run(&mut policies, &mut sampler, &quantifier)
        .unwrap_err();

    assert!(matches!(err, RbsError::EmptyCorpus { ref arm } if arm == "B"));
    assert_eq!(scorer.calls(), 0);
}

#[test]
fn full_exploration_is_near_uniform() {
    let all = arms(["A", "B", "C"]);
    let mut policy = EpsilonGreedy::new(all.clone(), 1.0, StdRng::seed_from_u64(11)).unwrap();
    let rounds = 3000;
    let mut counts = [0usize; 3];
    for round in 0..rounds {
        let arm = policy.select();
        let idx = all.iter().position(|a| *a == arm).unwrap();
        counts[idx] += 1;
        // A is always best; with epsilon 1 that must not matter.
        let reward = if idx == 0 { 1.0 } else { f64::from(round % 2) * 0.1 };
        policy.update(&arm, reward).unwrap();
    }
    for count in counts {
        let share = count as f64 / f64::from(rounds);
        assert!((0.28..0.39).contains(&share), "share {share} not near 1/3");
    }
}

#[test]
fn parallel_runs_are_reproducible() {
    let corpus = Arc::new(ab_corpus());
    let run = || -> ResultLog {
        let quantifier = unit_quantifier(Arc::new(keyword_scorer()));
        let mut policies = build_policies(PolicyKind::all(), corpus.arms(), 0.3, 99).unwrap();
        SimulationLoop::new(15)
            .run_parallel(
                &mut policies,
                &CyclingSampler::shuffled(Arc::clone(&corpus), 99),
                &quantifier,
            )
            .unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.len(), 45);
    assert_eq!(first, second);
    let steps: Vec<usize> = first.iter().take(6).map(|r| r.step).collect();
    assert_eq!(steps, vec![0, 0, 0, 1, 1, 1]);
}

#[test]
fn step_log_exports_as_json_lines() {
    let corpus = Arc::new(ab_corpus());
    let quantifier = unit_quantifier(Arc::new(keyword_scorer()));
    let mut policies = vec![fairweather(&["A", "B"])];
    let mut sampler = CyclingSampler::new(corpus);
    let log = SimulationLoop::new(2)
        .run(&mut policies, &mut sampler, &quantifier)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("steps.jsonl");
    log.write_jsonl(std::fs::File::create(&path).unwrap()).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let rows: Vec<serde_json::Value> = raw
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["step"], 1);
    assert_eq!(rows[1]["policy"], "FairweatherFriend");
    assert_eq!(rows[1]["arm"], "A");
    assert_eq!(rows[1]["success"], true);
}

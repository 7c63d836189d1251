use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use rbs::bandit::{Arm, EpsilonGreedy, FairweatherFriend, SelectionPolicy, ValueEstimator, arms};

fn three_arms() -> Vec<Arm> {
    arms(["A", "B", "C"])
}

proptest! {
    #[test]
    fn test_estimate_is_running_mean(rewards in prop::collection::vec(-1000.0f64..1000.0, 1..200)) {
        let mut estimator = ValueEstimator::new(0.0);
        for reward in &rewards {
            estimator.update(*reward);
        }
        let mean = rewards.iter().sum::<f64>() / rewards.len() as f64;
        prop_assert_eq!(estimator.count(), rewards.len() as u64);
        prop_assert!((estimator.estimate() - mean).abs() < 1e-6);
    }

    #[test]
    fn test_greedy_without_exploration_matches_fairweather(
        rewards in prop::collection::vec(0.0f64..100.0, 1..80),
        seed in any::<u64>(),
    ) {
        let mut greedy = EpsilonGreedy::new(three_arms(), 0.0, StdRng::seed_from_u64(seed))
            .unwrap()
            .with_initial_estimate(f64::NEG_INFINITY);
        let mut fairweather = FairweatherFriend::new(three_arms()).unwrap();

        for reward in rewards {
            let a = greedy.select();
            let b = fairweather.select();
            prop_assert_eq!(&a, &b);
            greedy.update(&a, reward).unwrap();
            fairweather.update(&b, reward).unwrap();
        }
    }

    #[test]
    fn test_fairweather_stays_on_best_estimate(
        rewards in prop::collection::vec((0usize..3, 0.0f64..10.0), 1..60),
    ) {
        let all = three_arms();
        let mut policy = FairweatherFriend::new(all.clone()).unwrap();
        for (idx, reward) in rewards {
            policy.update(&all[idx], reward).unwrap();
            let chosen = policy.select();
            let stats = policy.stats();
            let chosen_mean = stats
                .iter()
                .find(|s| s.arm == chosen)
                .and_then(|s| s.mean)
                .unwrap();
            for other in &stats {
                if let Some(mean) = other.mean {
                    prop_assert!(chosen_mean >= mean);
                }
            }
        }
    }
}

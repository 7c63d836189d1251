//! Property test suite entry point.

mod bandit_tests;
mod scoring_tests;

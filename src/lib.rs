//! rbs - Review Bandit Simulator
//!
//! Multi-armed bandit policies choose restaurants, and rewards come from
//! review text scored by an external language model.

pub mod app;
pub mod bandit;
pub mod cli;
pub mod config;
pub mod error;
pub mod reviews;
pub mod scoring;
pub mod simulation;
pub mod test_utils;

pub use error::{RbsError, Result};

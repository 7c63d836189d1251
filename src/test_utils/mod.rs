//! Shared test utilities for rbs: scripted scorers, a recording sleeper,
//! corpus fixtures and log capture.

pub mod fixtures;
pub mod logging;

//! Review corpus and per-arm review sampling.

pub mod corpus;
pub mod sampler;

pub use corpus::ReviewCorpus;
pub use sampler::{CyclingSampler, ReviewSampler, SynchronizedSampler};

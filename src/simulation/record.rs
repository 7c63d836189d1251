//! Step records and the append-only result log.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::bandit::Arm;
use crate::error::Result;

/// Outcome of one policy's turn at one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: usize,
    pub policy: String,
    pub arm: Arm,
    pub review: String,
    pub reward: Option<f64>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepRecord {
    #[must_use]
    pub fn scored(step: usize, policy: &str, arm: Arm, review: String, reward: f64) -> Self {
        Self {
            step,
            policy: policy.to_string(),
            arm,
            review,
            reward: Some(reward),
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(step: usize, policy: &str, arm: Arm, review: String, error: String) -> Self {
        Self {
            step,
            policy: policy.to_string(),
            arm,
            review,
            reward: None,
            success: false,
            error: Some(error),
        }
    }
}

/// Ordered records of a run. Records cannot be changed once appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultLog {
    records: Vec<StepRecord>,
}

impl ResultLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn append(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StepRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.records.iter().filter(|record| !record.success)
    }

    /// Records of a single policy, in step order.
    pub fn for_policy<'a>(&'a self, policy: &'a str) -> impl Iterator<Item = &'a StepRecord> {
        self.records.iter().filter(move |record| record.policy == policy)
    }

    /// Write one JSON object per line.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> Result<()> {
        for record in &self.records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ResultLog {
    type Item = &'a StepRecord;
    type IntoIter = std::slice::Iter<'a, StepRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

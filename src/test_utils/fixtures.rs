use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use crate::error::{RbsError, Result};
use crate::reviews::ReviewCorpus;
use crate::scoring::{ExternalScorer, Sleeper};

enum Script {
    /// Replies in order; the last reply repeats once the queue is drained.
    Sequence(Mutex<VecDeque<Reply>>),
    /// First matching keyword wins, otherwise `fallback`.
    Keywords {
        rules: Vec<(String, String)>,
        fallback: String,
    },
}

#[derive(Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

impl Reply {
    fn from_result(result: Result<String>) -> Self {
        match result {
            Ok(text) => Self::Text(text),
            Err(err) => Self::Fail(err.to_string()),
        }
    }

    fn into_result(self) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Fail(message) => Err(RbsError::Transport(message)),
        }
    }
}

/// In-process scorer with canned replies and a call counter.
pub struct ScriptedScorer {
    script: Script,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedScorer {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers `reply`.
    #[must_use]
    pub fn fixed(reply: &str) -> Self {
        Self::sequence([Ok(reply.to_string())])
    }

    /// Answers from `replies` in order. Errors are replayed as transport
    /// failures carrying the original message.
    pub fn sequence(replies: impl IntoIterator<Item = Result<String>>) -> Self {
        let queue = replies.into_iter().map(Reply::from_result).collect();
        Self::with_script(Script::Sequence(Mutex::new(queue)))
    }

    /// Every call fails with a transport error.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self::sequence([Err(RbsError::Transport(message.to_string()))])
    }

    /// Answers by the first keyword found in the review.
    pub fn by_keyword<'a>(
        rules: impl IntoIterator<Item = (&'a str, &'a str)>,
        fallback: &str,
    ) -> Self {
        Self::with_script(Script::Keywords {
            rules: rules
                .into_iter()
                .map(|(keyword, reply)| (keyword.to_string(), reply.to_string()))
                .collect(),
            fallback: fallback.to_string(),
        })
    }

    /// Block each call for `delay` before answering.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExternalScorer for ScriptedScorer {
    fn score_raw(&self, review: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        match &self.script {
            Script::Sequence(queue) => {
                let mut queue = queue.lock();
                let reply = if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                };
                reply
                    .unwrap_or_else(|| Reply::Fail("script is empty".to_string()))
                    .into_result()
            }
            Script::Keywords { rules, fallback } => Ok(rules
                .iter()
                .find(|(keyword, _)| review.contains(keyword.as_str()))
                .map_or_else(|| fallback.clone(), |(_, reply)| reply.clone())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// "great" scores 1.0, "bad" scores 0.0, anything else 0.5.
#[must_use]
pub fn keyword_scorer() -> ScriptedScorer {
    ScriptedScorer::by_keyword([("great", "1.0"), ("bad", "0.0")], "0.5")
}

/// Records requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
    }
}

/// Two arms: "A" with only great reviews, "B" with only bad ones.
#[must_use]
pub fn ab_corpus() -> ReviewCorpus {
    let mut corpus = ReviewCorpus::new();
    corpus.insert("A", ["great food", "great staff", "great value"]);
    corpus.insert("B", ["bad food", "bad service", "bad value"]);
    corpus
}

/// Isolated directory for corpus and config files.
pub struct CorpusFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl Default for CorpusFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();
        Self {
            temp_dir,
            data_path,
        }
    }

    #[must_use]
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Write `corpus` in the `{ "arm": ["review", ...] }` layout.
    #[must_use]
    pub fn write_corpus(&self, name: &str, corpus: &ReviewCorpus) -> PathBuf {
        let map: serde_json::Map<String, serde_json::Value> = corpus
            .arms()
            .iter()
            .map(|arm| (arm.to_string(), serde_json::json!(corpus.reviews(arm))))
            .collect();
        let raw = serde_json::to_string_pretty(&map).expect("Failed to encode corpus");
        self.create_file(name, &raw)
    }
}

//! Log capture for tests that assert on emitted tracing events.

use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Level;
use tracing_subscriber::prelude::*;

/// A captured tracing event.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Events captured while a closure ran.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    entries: Vec<LogEntry>,
}

impl CapturedLogs {
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.level == level && e.message.contains(message))
    }

    #[must_use]
    pub fn with_level(&self, level: Level) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.level == level).collect()
    }

    /// Human-readable dump for assertion failures.
    #[must_use]
    pub fn display(&self) -> String {
        if self.entries.is_empty() {
            return String::from("No logs captured");
        }
        let mut output = format!("Captured {} log entries:\n", self.entries.len());
        for entry in &self.entries {
            let _ = writeln!(
                output,
                "[{}] {}: {}",
                entry.level, entry.target, entry.message
            );
            for (key, value) in &entry.fields {
                let _ = writeln!(output, "    {key} = {value}");
            }
        }
        output
    }
}

/// Layer that appends every event to shared storage.
pub struct TestLogLayer {
    storage: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogLayer {
    pub const fn new(storage: Arc<Mutex<Vec<LogEntry>>>) -> Self {
        Self { storage }
    }
}

struct FieldVisitor<'a> {
    message: &'a mut String,
    fields: &'a mut Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            *self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            *self.message = value;
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl<S> tracing_subscriber::Layer<S> for TestLogLayer
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let mut message = String::new();
        let mut fields = Vec::new();
        event.record(&mut FieldVisitor {
            message: &mut message,
            fields: &mut fields,
        });
        self.storage.lock().push(LogEntry {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message,
            fields,
        });
    }
}

/// Run `f` with a thread-local subscriber and return what it logged.
///
/// Only events emitted on the calling thread are captured.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let storage = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(TestLogLayer::new(Arc::clone(&storage)));
    let value = tracing::subscriber::with_default(subscriber, f);
    let entries = std::mem::take(&mut *storage.lock());
    (value, CapturedLogs { entries })
}

/// Assert that `logs` holds an event at `level` whose message contains `message`.
#[macro_export]
macro_rules! assert_log_contains {
    ($logs:expr, $level:expr, $message:expr) => {{
        let logs = &$logs;
        assert!(
            logs.contains($level, $message),
            "Expected log with level {} containing '{}'\n{}",
            $level,
            $message,
            logs.display()
        );
    }};
}

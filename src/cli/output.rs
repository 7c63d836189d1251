use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

use crate::error::{RbsError, Result};

/// Envelope for every JSON document printed in robot mode.
#[derive(Serialize)]
pub struct RobotResponse<T> {
    pub status: RobotStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    Ok,
    Error { code: String, message: String },
    Partial { completed: usize, failed: usize },
}

pub fn robot_ok<T: Serialize>(data: T) -> RobotResponse<T> {
    RobotResponse {
        status: RobotStatus::Ok,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data,
        warnings: Vec::new(),
    }
}

/// A run that finished with some failed steps.
pub fn robot_partial<T: Serialize>(data: T, completed: usize, failed: usize) -> RobotResponse<T> {
    RobotResponse {
        status: RobotStatus::Partial { completed, failed },
        warnings: vec![format!("{failed} step(s) could not be scored")],
        ..robot_ok(data)
    }
}

pub fn robot_error(
    code: impl Into<String>,
    message: impl Into<String>,
) -> RobotResponse<serde_json::Value> {
    RobotResponse {
        status: RobotStatus::Error {
            code: code.into(),
            message: message.into(),
        },
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data: serde_json::Value::Null,
        warnings: Vec::new(),
    }
}

/// Robot-mode rendering of a failed command.
pub fn robot_error_for(err: &RbsError) -> RobotResponse<serde_json::Value> {
    robot_error(err.code(), err.to_string())
}

pub fn emit_robot<T: Serialize>(response: &RobotResponse<T>) -> Result<()> {
    emit_json(response)
}

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)?;
    println!("{payload}");
    Ok(())
}

pub struct HumanLayout {
    lines: Vec<String>,
    key_width: usize,
}

impl Default for HumanLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanLayout {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            key_width: 20,
        }
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push(String::new());
        self
    }

    pub fn section(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push("-".repeat(text.len().max(3)));
        self
    }

    pub fn kv(&mut self, key: &str, value: &str) -> &mut Self {
        let padded = format!("{key:width$}", width = self.key_width);
        self.lines.push(format!("{} {value}", style(padded).dim()));
        self
    }

    pub fn bullet(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("- {text}"));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    #[must_use]
    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

pub fn emit_human(layout: HumanLayout) {
    println!("{}", layout.build());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_response_reports_counts() {
        let response = robot_partial(serde_json::json!({"steps": 3}), 5, 1);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"]["partial"]["completed"], 5);
        assert_eq!(value["status"]["partial"]["failed"], 1);
        assert_eq!(value["data"]["steps"], 3);
        assert_eq!(value["warnings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn error_response_carries_code() {
        let err = RbsError::EmptyCorpus {
            arm: "B".to_string(),
        };
        let value = serde_json::to_value(robot_error_for(&err)).unwrap();
        assert_eq!(value["status"]["error"]["code"], "empty_corpus");
        assert!(value["data"].is_null());
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn layout_keeps_values_in_order() {
        console::set_colors_enabled(false);
        let mut layout = HumanLayout::new();
        layout.title("Run").kv("Steps", "10").bullet("done");
        let text = layout.build();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Run");
        assert!(lines[2].starts_with("Steps"));
        assert!(lines[2].ends_with(" 10"));
        assert_eq!(lines[3], "- done");
    }
}

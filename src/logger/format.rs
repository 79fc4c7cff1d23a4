use std::fmt;

use chrono::{DateTime, Local};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A single formatted line, timestamped when the event was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine(String);

impl LogLine {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn format_line(message: &str, captured_at: DateTime<Local>) -> LogLine {
    LogLine(format!(
        "[{}] {}",
        captured_at.format(TIMESTAMP_FORMAT),
        message
    ))
}

pub fn format_now(message: &str) -> LogLine {
    format_line(message, Local::now())
}

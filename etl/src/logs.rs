//! Console log helpers.
//!
//! Stage code and report rendering speak in [`LogEntry`] values; [`emit`]
//! hands them to `tracing`, whose subscriber is installed by the binary.

use serde::{Deserialize, Serialize};

/// Log level for console display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth, rendered as leading spaces
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Console form: indentation, level marker, message.
    pub fn line(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info => "",
            LogLevel::Success => "✓ ",
            LogLevel::Warning => "⚠️ ",
            LogLevel::Error => "❌ ",
        };
        format!("{}{}{}", "   ".repeat(self.indent as usize), prefix, self.message)
    }
}

/// Send one entry to the tracing subscriber.
pub fn emit(entry: &LogEntry) {
    let line = entry.line();
    match entry.level {
        LogLevel::Info | LogLevel::Success => tracing::info!("{}", line),
        LogLevel::Warning => tracing::warn!("{}", line),
        LogLevel::Error => tracing::error!("{}", line),
    }
}

pub fn emit_all(entries: &[LogEntry]) {
    entries.iter().for_each(emit);
}

pub fn log_info(msg: impl Into<String>) {
    emit(&LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    emit(&LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    emit(&LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    emit(&LogEntry::error(msg));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_rendering() {
        assert_eq!(LogEntry::info("rows: 3").line(), "rows: 3");
        assert_eq!(LogEntry::success("done").with_indent(1).line(), "   ✓ done");
        assert!(LogEntry::error("boom").line().starts_with("❌"));
    }

    #[test]
    fn test_entry_serializes_lowercase_level() {
        let json = serde_json::to_value(LogEntry::warning("w")).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["indent"], 0);
    }
}

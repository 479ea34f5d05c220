// src/system/output.rs

use colored::Colorize;
use std::fmt;
use std::sync::Mutex;

/// Severity/category attached to every line written to an [`OutputSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogType {
    Info,
    Warning,
    Error,
    Success,
}

/// Display-only consumer of lifecycle output.
///
/// `message` is the short form, `long_message` the optional detail (for
/// instance the captured output of a failed script). Implementations must not
/// fail: nothing upstream inspects what happens to a line once it is logged.
pub trait OutputSink: Send + Sync {
    fn log(&self, kind: LogType, message: &str, long_message: Option<&str>);
}

/// Writes lines to the terminal, colored by severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn log(&self, kind: LogType, message: &str, long_message: Option<&str>) {
        let line = match kind {
            LogType::Info => message.normal(),
            LogType::Warning => message.yellow(),
            LogType::Error => message.red(),
            LogType::Success => message.green(),
        };
        match kind {
            LogType::Error | LogType::Warning => eprintln!("{}", line),
            _ => println!("{}", line),
        }
        if let Some(detail) = long_message {
            eprintln!("{}", detail.dimmed());
        }
    }
}

/// Keeps every line in memory. Useful when output has to be inspected after the fact.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(LogType, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything logged so far, in order.
    pub fn lines(&self) -> Vec<(LogType, String)> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySink")
            .field("lines", &self.lines().len())
            .finish()
    }
}

impl OutputSink for MemorySink {
    fn log(&self, kind: LogType, message: &str, long_message: Option<&str>) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((kind, message.to_string()));
            if let Some(detail) = long_message {
                lines.push((kind, detail.to_string()));
            }
        }
    }
}

use std::sync::LazyLock;

use regex::Regex;

use crate::LogRecord;

/// `<level> at <timestamp>s: <class>::<method>() -> <message>`, leftmost delimiters win
static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?) at (.*?)s: (.*?)::(.*?)\(\) -> (.*)$").expect("log line pattern is valid")
});

/// Log parser for extracting structure from raw log lines
pub struct LogParser;

impl LogParser {
    /// Parse a raw log line into a LogRecord
    ///
    /// Returns `None` for anything that is not a log line (blank lines, stack
    /// traces, partial writes).
    pub fn parse(raw: &str) -> Option<LogRecord> {
        let line = Self::strip_terminator(raw);
        let caps = LINE_PATTERN.captures(line)?;

        Some(LogRecord::new(
            &caps[1], &caps[2], &caps[3], &caps[4], &caps[5],
        ))
    }

    fn strip_terminator(raw: &str) -> &str {
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        line.strip_suffix('\r').unwrap_or(line)
    }
}

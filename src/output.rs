//! Rendering of accepted records to the terminal

use std::io::IsTerminal;

use clap::ValueEnum;
use crossterm::style::{Color, Stylize, style};
use serde::Deserialize;

use logreader_logs::LogRecord;

/// When to color level labels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color only when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn enabled(self) -> bool {
        match self {
            Self::Auto => std::io::stdout().is_terminal(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Display color for a level label
fn level_color(level: &str) -> Option<Color> {
    match level {
        "DEBUG" => Some(Color::Cyan),
        "INFO" => Some(Color::Green),
        "WARNING" => Some(Color::Yellow),
        "ERROR" => Some(Color::Red),
        _ => None,
    }
}

/// Same layout as [`LogRecord::format_line`], with the level label colored
pub fn render_colored(record: &LogRecord) -> String {
    let Some(color) = level_color(&record.level) else {
        return record.format_line();
    };

    format!(
        "{} at {}s: {}::{}() -> {}\n",
        style(record.level.as_str()).with(color).bold(),
        record.timestamp,
        record.qualified_class,
        record.method,
        record.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_level_is_plain() {
        let record = LogRecord::new("custom", "1.0", "a.B", "m", "ok");
        assert_eq!(render_colored(&record), record.format_line());
    }

    #[test]
    fn test_colored_line_keeps_layout() {
        let record = LogRecord::new("INFO", "12.5", "org.robot.Drive", "periodic", "moving forward");
        let rendered = render_colored(&record);
        assert!(rendered.contains("INFO"));
        assert!(rendered.ends_with(" at 12.5s: org.robot.Drive::periodic() -> moving forward\n"));
    }

    #[test]
    fn test_forced_modes() {
        assert!(ColorMode::Always.enabled());
        assert!(!ColorMode::Never.enabled());
    }
}

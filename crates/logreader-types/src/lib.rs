//! Shared types for logreader
//!
//! This crate contains data structures used across multiple logreader crates.

use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Name of the log file written by the robot program
pub const LOG_FILE_NAME: &str = "FRC_UserProgram.log";

/// Account the robot program runs under (its password is empty)
pub const REMOTE_USER: &str = "lvuser";

/// Levels shown when none are configured
pub const DEFAULT_LEVELS: [&str; 2] = ["INFO", "WARNING"];

// ============================================================================
// Log Types
// ============================================================================

/// A single structured log line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity label, kept verbatim
    pub level: String,

    /// Seconds since program start, as emitted
    pub timestamp: String,

    /// Dot-separated package/class path
    pub qualified_class: String,

    /// Originating method name (no parentheses)
    pub method: String,

    /// Remaining free-form text
    pub message: String,
}

impl LogRecord {
    pub fn new(
        level: impl Into<String>,
        timestamp: impl Into<String>,
        qualified_class: impl Into<String>,
        method: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level: level.into(),
            timestamp: timestamp.into(),
            qualified_class: qualified_class.into(),
            method: method.into(),
            message: message.into(),
        }
    }

    /// Segments of the qualified class path, in order
    pub fn class_segments(&self) -> impl Iterator<Item = &str> {
        self.qualified_class.split('.')
    }

    /// Last segment of the qualified class path
    pub fn class_leaf(&self) -> &str {
        self.qualified_class
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_class)
    }

    /// Render the record back into its log-line form, newline terminated
    pub fn format_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}s: {}::{}() -> {}",
            self.level,
            self.timestamp,
            self.class_segments().collect::<Vec<_>>().join("."),
            self.method,
            self.message
        )
    }
}

// ============================================================================
// Filter Types
// ============================================================================

/// Inclusion criteria for log records, fixed for the lifetime of a run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterConfig {
    /// Upper-cased levels to show
    pub allowed_levels: BTreeSet<String>,

    /// Upper-cased class leaves to show (empty = all)
    pub allowed_classes: BTreeSet<String>,

    /// Upper-cased method names to show (empty = all)
    pub allowed_methods: BTreeSet<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allowed_levels: DEFAULT_LEVELS.iter().map(|l| l.to_string()).collect(),
            allowed_classes: BTreeSet::new(),
            allowed_methods: BTreeSet::new(),
        }
    }
}

impl FilterConfig {
    /// Build a config from comma-separated lists
    ///
    /// `None` levels falls back to [`DEFAULT_LEVELS`]; `None` classes or
    /// methods allow everything.
    pub fn from_lists(levels: Option<&str>, classes: Option<&str>, methods: Option<&str>) -> Self {
        let allowed_levels = match levels {
            Some(list) => split_upper(list),
            None => Self::default().allowed_levels,
        };

        Self {
            allowed_levels,
            allowed_classes: classes.map(split_upper).unwrap_or_default(),
            allowed_methods: methods.map(split_upper).unwrap_or_default(),
        }
    }
}

impl fmt::Display for FilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Levels: {}", join_or_all(&self.allowed_levels))?;
        writeln!(f, "Classes: {}", join_or_all(&self.allowed_classes))?;
        write!(f, "Methods: {}", join_or_all(&self.allowed_methods))
    }
}

fn split_upper(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_uppercase)
        .collect()
}

fn join_or_all(set: &BTreeSet<String>) -> String {
    if set.is_empty() {
        "(all)".to_string()
    } else {
        set.iter().cloned().collect::<Vec<_>>().join(",")
    }
}

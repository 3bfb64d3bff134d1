use crate::{FilterConfig, LogRecord};

/// Filter for log records built from a [`FilterConfig`]
#[derive(Clone, Debug)]
pub struct CompiledFilter {
    config: FilterConfig,
}

impl CompiledFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Check if a log record passes every configured criterion
    pub fn matches(&self, record: &LogRecord) -> bool {
        accepts(record, &self.config)
    }
}

impl Default for CompiledFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

/// Decide whether `record` passes `config`
///
/// The record's level is compared verbatim against the upper-cased allowed
/// set, so a lower-case `info` line never matches. Class leaf and method are
/// upper-cased before comparison.
pub fn accepts(record: &LogRecord, config: &FilterConfig) -> bool {
    if !config.allowed_levels.contains(&record.level) {
        return false;
    }

    if !config.allowed_classes.is_empty()
        && !config
            .allowed_classes
            .contains(&record.class_leaf().to_uppercase())
    {
        return false;
    }

    if !config.allowed_methods.is_empty()
        && !config
            .allowed_methods
            .contains(&record.method.to_uppercase())
    {
        return false;
    }

    true
}

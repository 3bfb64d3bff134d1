//! Log processing for logreader
//!
//! This crate provides line parsing, filtering, the log sources, and the
//! loop that pumps one into the other.

mod error;
mod filter;
mod parser;
mod source;
mod stream;

pub use error::SourceError;
pub use filter::{CompiledFilter, accepts};
pub use parser::LogParser;
pub use source::{FollowingFile, LogSource, RemoteStream, SnapshotFile, SourceSpec};
pub use stream::{LogPump, PumpStats};

// Re-export types used in our public API
pub use logreader_types::{FilterConfig, LogRecord};

//! Robot connection handling for logreader
//!
//! This crate resolves which host to talk to and runs log-reading commands
//! on it through the system `ssh` client.

mod error;
mod session;
mod target;

pub use error::RemoteError;
pub use session::{RemoteSession, SessionOptions, read_command};
pub use target::RemoteTarget;

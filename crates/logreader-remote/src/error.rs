use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised while talking to the robot
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("ssh client `{binary}` could not be started: {source}")]
    Unavailable {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not open a session to {host}: {stderr}")]
    Connection { host: String, stderr: String },
    #[error("remote command `{command}` on {host} exited with {status}: {stderr}")]
    Command {
        host: String,
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("failed to read from remote session: {0}")]
    Io(#[from] std::io::Error),
}

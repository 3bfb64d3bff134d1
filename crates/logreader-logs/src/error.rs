use std::path::PathBuf;

use thiserror::Error;

use logreader_remote::RemoteError;

/// Errors raised while acquiring log lines
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("log file `{path}` does not exist")]
    SourceUnavailable { path: PathBuf },
    #[error("failed to read log file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("failed to write log output: {0}")]
    Output(#[source] std::io::Error),
}

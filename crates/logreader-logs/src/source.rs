use std::collections::VecDeque;
use std::fmt;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tracing::{debug, warn};

use logreader_remote::{RemoteSession, SessionOptions, read_command};

use crate::SourceError;

/// Delay between polls when a followed file has no new complete line
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Which source to open, decided once from the resolved configuration
#[derive(Clone, Debug)]
pub enum SourceSpec {
    /// Read a local file once
    Snapshot { path: PathBuf },
    /// Follow a local file as it grows
    Follow { path: PathBuf, poll_interval: Duration },
    /// Read the robot's log over ssh, once or continuously
    Remote {
        host: String,
        follow: bool,
        options: SessionOptions,
    },
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot { path } => write!(f, "snapshot of {}", path.display()),
            Self::Follow { path, .. } => write!(f, "follow of {}", path.display()),
            Self::Remote { host, follow, .. } => {
                write!(f, "{} on {}", read_command(*follow), host)
            }
        }
    }
}

/// A sequence of raw log lines
///
/// Every variant hands out lines without their terminator. `Ok(None)` means
/// the source is exhausted; following sources never return it.
pub enum LogSource {
    Snapshot(SnapshotFile),
    Following(FollowingFile),
    Remote(RemoteStream),
}

impl LogSource {
    /// Open the source described by `spec`
    pub async fn open(spec: &SourceSpec) -> Result<Self, SourceError> {
        debug!(source = %spec, "opening log source");
        let source = match spec {
            SourceSpec::Snapshot { path } => Self::Snapshot(SnapshotFile::open(path).await?),
            SourceSpec::Follow {
                path,
                poll_interval,
            } => Self::Following(FollowingFile::open(path, *poll_interval).await?),
            SourceSpec::Remote {
                host,
                follow,
                options,
            } => Self::Remote(RemoteStream::open(host, *follow, options)?),
        };
        Ok(source)
    }

    /// Produce the next raw line, waiting for one if the source is live
    pub async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        match self {
            Self::Snapshot(source) => Ok(source.next_line()),
            Self::Following(source) => source.next_line().await.map(Some),
            Self::Remote(source) => source.next_line().await,
        }
    }

    /// Release the file handle or remote session
    pub async fn close(self) {
        match self {
            Self::Snapshot(_) => {}
            Self::Following(source) => {
                debug!(path = %source.path.display(), "closing followed file");
            }
            Self::Remote(source) => source.close().await,
        }
    }
}

/// A local file read in full up front
pub struct SnapshotFile {
    lines: VecDeque<String>,
}

impl SnapshotFile {
    pub async fn open(path: &Path) -> Result<Self, SourceError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| file_error(path, source))?;
        let lines: VecDeque<String> = String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect();

        debug!(path = %path.display(), lines = lines.len(), "read log snapshot");
        Ok(Self { lines })
    }

    pub fn next_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

/// A local file followed as it is appended to
pub struct FollowingFile {
    path: PathBuf,
    reader: BufReader<File>,
    pending: Vec<u8>,
    offset: u64,
    poll_interval: Duration,
}

impl FollowingFile {
    pub async fn open(path: &Path, poll_interval: Duration) -> Result<Self, SourceError> {
        let file = File::open(path)
            .await
            .map_err(|source| file_error(path, source))?;

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            pending: Vec::new(),
            offset: 0,
            poll_interval,
        })
    }

    /// Wait for the next complete line
    ///
    /// A partially written line stays buffered until its newline arrives.
    /// Cancellation safe.
    pub async fn next_line(&mut self) -> Result<String, SourceError> {
        loop {
            let read = match self.reader.read_until(b'\n', &mut self.pending).await {
                Ok(read) => read,
                Err(source) => return Err(self.read_error(source)),
            };
            self.offset += read as u64;

            if self.pending.last() == Some(&b'\n') {
                return Ok(decode_line(std::mem::take(&mut self.pending)));
            }

            if read == 0 {
                self.rewind_if_truncated().await?;
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }

    /// Start over when the file shrank beneath us (program restarted)
    async fn rewind_if_truncated(&mut self) -> Result<(), SourceError> {
        let len = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "could not stat followed file");
                return Ok(());
            }
        };

        if len < self.offset {
            warn!(path = %self.path.display(), "log file truncated, reading from start");
            if let Err(source) = self.reader.seek(SeekFrom::Start(0)).await {
                return Err(self.read_error(source));
            }
            self.pending.clear();
            self.offset = 0;
        }
        Ok(())
    }

    fn read_error(&self, source: std::io::Error) -> SourceError {
        SourceError::Read {
            path: self.path.clone(),
            source,
        }
    }
}

/// The stdout of a log-reading command running on the robot
pub struct RemoteStream {
    session: Option<RemoteSession>,
    pending: Vec<u8>,
}

impl RemoteStream {
    /// Start `cat` (or `tail -f` when following) of the robot log on `host`
    pub fn open(host: &str, follow: bool, options: &SessionOptions) -> Result<Self, SourceError> {
        let session = RemoteSession::spawn(host, &read_command(follow), options)?;
        Ok(Self {
            session: Some(session),
            pending: Vec::new(),
        })
    }

    /// Wait for the next line from the remote command
    ///
    /// At end of output the command's exit status is checked, so a session
    /// that never connected reports a connection error here.
    pub async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        loop {
            let Some(session) = self.session.as_mut() else {
                return Ok(None);
            };

            let read = session.read_line(&mut self.pending).await?;

            if read == 0 {
                if !self.pending.is_empty() {
                    return Ok(Some(decode_line(std::mem::take(&mut self.pending))));
                }
                if let Some(session) = self.session.take() {
                    session.finish().await?;
                }
                return Ok(None);
            }

            if self.pending.last() == Some(&b'\n') {
                return Ok(Some(decode_line(std::mem::take(&mut self.pending))));
            }
        }
    }

    pub async fn close(mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }
}

fn file_error(path: &Path, source: std::io::Error) -> SourceError {
    if source.kind() == ErrorKind::NotFound {
        SourceError::SourceUnavailable {
            path: path.to_path_buf(),
        }
    } else {
        SourceError::Read {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn decode_line(bytes: Vec<u8>) -> String {
    let mut line = match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

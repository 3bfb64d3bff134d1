use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::debug;

use logreader_types::{LOG_FILE_NAME, REMOTE_USER};

use crate::RemoteError;

/// Status ssh exits with when the session itself fails
const SSH_FAILURE_STATUS: i32 = 255;

/// How sessions are opened
#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// ssh client to run
    pub ssh_binary: PathBuf,

    /// Remote account
    pub user: String,

    /// Upper bound on connection establishment
    pub connect_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            ssh_binary: PathBuf::from("ssh"),
            user: REMOTE_USER.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Remote shell command that prints the robot log, once or continuously
pub fn read_command(follow: bool) -> String {
    if follow {
        format!("tail -f ~/{LOG_FILE_NAME}")
    } else {
        format!("cat ~/{LOG_FILE_NAME}")
    }
}

/// A command running on the robot with its stdout exposed line by line
pub struct RemoteSession {
    host: String,
    command: String,
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_task: JoinHandle<Vec<u8>>,
}

impl RemoteSession {
    /// Build the ssh invocation for a remote command
    ///
    /// Batch mode never prompts; the robot account has an empty password, which
    /// the server accepts through the `none` auth method.
    pub fn build_command(host: &str, remote_command: &str, options: &SessionOptions) -> Command {
        let mut command = Command::new(&options.ssh_binary);
        command
            .arg("-T")
            .arg("-o")
            .arg("BatchMode=yes")
            .arg("-o")
            .arg(format!(
                "ConnectTimeout={}",
                options.connect_timeout.as_secs().max(1)
            ))
            .arg("-o")
            .arg("StrictHostKeyChecking=no")
            .arg("-o")
            .arg("UserKnownHostsFile=/dev/null")
            .arg("-o")
            .arg("LogLevel=ERROR")
            .arg(format!("{}@{}", options.user, host))
            .arg(remote_command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Keep terminal signals away from ssh; interrupts go through close()
        #[cfg(unix)]
        command.process_group(0);

        command
    }

    /// Start `remote_command` on `host`
    ///
    /// Must be called from within a tokio runtime. Connection failures surface
    /// from [`RemoteSession::finish`] once ssh gives up.
    pub fn spawn(
        host: &str,
        remote_command: &str,
        options: &SessionOptions,
    ) -> Result<Self, RemoteError> {
        let mut command = Self::build_command(host, remote_command, options);
        let mut child = command.spawn().map_err(|source| RemoteError::Unavailable {
            binary: options.ssh_binary.clone(),
            source,
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("ssh stdout was not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("ssh stderr was not captured"))?;

        let stderr_task = tokio::spawn(async move {
            let mut captured = Vec::new();
            if let Err(e) = stderr.read_to_end(&mut captured).await {
                debug!(error = %e, "could not read ssh stderr");
            }
            captured
        });

        debug!(host, command = remote_command, "remote session started");

        Ok(Self {
            host: host.to_string(),
            command: remote_command.to_string(),
            child,
            stdout: BufReader::new(stdout),
            stderr_task,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Append the next chunk of output, up to and including a newline, to `buf`
    ///
    /// Returns 0 at end of output. Cancellation safe: bytes already read stay
    /// in `buf`.
    pub async fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<usize, RemoteError> {
        Ok(self.stdout.read_until(b'\n', buf).await?)
    }

    /// Wait for the remote command to exit after its output ended
    pub async fn finish(mut self) -> Result<(), RemoteError> {
        let status = self.child.wait().await?;
        let stderr = (&mut self.stderr_task).await.unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr).trim().to_string();

        debug!(host = %self.host, %status, "remote session finished");

        if status.success() {
            return Ok(());
        }

        if status.code() == Some(SSH_FAILURE_STATUS) {
            return Err(RemoteError::Connection {
                host: self.host,
                stderr,
            });
        }

        Err(RemoteError::Command {
            host: self.host,
            command: self.command,
            status,
            stderr,
        })
    }

    /// Terminate the remote command and reap the ssh process
    pub async fn close(mut self) {
        if let Err(e) = self.child.start_kill() {
            debug!(host = %self.host, error = %e, "ssh process already exited");
        }
        let _ = self.child.wait().await;
        self.stderr_task.abort();
        debug!(host = %self.host(), "remote session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(command: &Command) -> Vec<String> {
        command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_read_command() {
        assert_eq!(read_command(false), "cat ~/FRC_UserProgram.log");
        assert_eq!(read_command(true), "tail -f ~/FRC_UserProgram.log");
    }

    #[test]
    fn test_build_command() {
        let options = SessionOptions {
            connect_timeout: Duration::from_secs(3),
            ..Default::default()
        };
        let command = RemoteSession::build_command("10.50.24.2", &read_command(true), &options);

        assert_eq!(command.as_std().get_program(), "ssh");
        let args = args_of(&command);
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert!(args.contains(&"ConnectTimeout=3".to_string()));
        assert_eq!(args[args.len() - 2], "lvuser@10.50.24.2");
        assert_eq!(args[args.len() - 1], "tail -f ~/FRC_UserProgram.log");
    }

    #[test]
    fn test_connect_timeout_is_at_least_one_second() {
        let options = SessionOptions {
            connect_timeout: Duration::from_millis(10),
            ..Default::default()
        };
        let command = RemoteSession::build_command("127.0.0.1", "true", &options);
        assert!(args_of(&command).contains(&"ConnectTimeout=1".to_string()));
    }

    #[tokio::test]
    async fn test_missing_ssh_binary() {
        let options = SessionOptions {
            ssh_binary: PathBuf::from("/nonexistent/logreader-ssh"),
            ..Default::default()
        };
        let result = RemoteSession::spawn("127.0.0.1", "true", &options);
        assert!(matches!(result, Err(RemoteError::Unavailable { .. })));
    }

    #[cfg(unix)]
    mod fake_ssh {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn fake_ssh(dir: &tempfile::TempDir, body: &str) -> SessionOptions {
            let path = dir.path().join("ssh");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            SessionOptions {
                ssh_binary: path,
                ..Default::default()
            }
        }

        async fn drain(session: &mut RemoteSession) -> Vec<String> {
            let mut lines = Vec::new();
            let mut buf = Vec::new();
            while session.read_line(&mut buf).await.unwrap() > 0 {
                lines.push(String::from_utf8_lossy(&buf).trim_end().to_string());
                buf.clear();
            }
            lines
        }

        #[tokio::test]
        async fn test_streams_stdout_and_exits_cleanly() {
            let dir = tempfile::tempdir().unwrap();
            let options = fake_ssh(&dir, "printf 'one\\ntwo\\n'");

            let mut session = RemoteSession::spawn("127.0.0.1", "cat", &options).unwrap();
            assert_eq!(session.host(), "127.0.0.1");
            assert_eq!(drain(&mut session).await, vec!["one", "two"]);
            assert!(session.finish().await.is_ok());
        }

        #[tokio::test]
        async fn test_ssh_failure_is_connection_error() {
            let dir = tempfile::tempdir().unwrap();
            let options = fake_ssh(&dir, "echo 'connect to host: timed out' >&2; exit 255");

            let mut session = RemoteSession::spawn("10.50.24.2", "cat", &options).unwrap();
            assert!(drain(&mut session).await.is_empty());
            match session.finish().await {
                Err(RemoteError::Connection { host, stderr }) => {
                    assert_eq!(host, "10.50.24.2");
                    assert!(stderr.contains("timed out"));
                }
                other => panic!("expected connection error, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_remote_command_failure() {
            let dir = tempfile::tempdir().unwrap();
            let options = fake_ssh(&dir, "echo 'cat: no such file' >&2; exit 1");

            let mut session = RemoteSession::spawn("10.50.24.2", "cat", &options).unwrap();
            drain(&mut session).await;
            assert!(matches!(
                session.finish().await,
                Err(RemoteError::Command { .. })
            ));
        }

        #[cfg(target_os = "linux")]
        #[tokio::test]
        async fn test_ssh_runs_in_its_own_process_group() {
            let dir = tempfile::tempdir().unwrap();
            let options = fake_ssh(
                &dir,
                "echo \"$$ $(cut -d' ' -f5 /proc/$$/stat) $(cut -d' ' -f5 /proc/$PPID/stat)\"",
            );

            let mut session = RemoteSession::spawn("127.0.0.1", "tail -f", &options).unwrap();
            let lines = drain(&mut session).await;
            session.finish().await.unwrap();

            let ids: Vec<&str> = lines[0].split_whitespace().collect();
            assert_eq!(ids.len(), 3);
            assert_eq!(ids[0], ids[1], "ssh should lead its own process group");
            assert_ne!(ids[1], ids[2], "ssh should not share the caller's group");
        }

        #[tokio::test]
        async fn test_close_kills_running_command() {
            let dir = tempfile::tempdir().unwrap();
            let options = fake_ssh(&dir, "echo ready; exec sleep 30");

            let mut session = RemoteSession::spawn("127.0.0.1", "tail -f", &options).unwrap();
            let mut buf = Vec::new();
            session.read_line(&mut buf).await.unwrap();
            assert_eq!(buf, b"ready\n");

            tokio::time::timeout(Duration::from_secs(5), session.close())
                .await
                .expect("close should not hang");
        }
    }
}

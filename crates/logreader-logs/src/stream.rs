use std::io::ErrorKind;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{CompiledFilter, LogParser, LogRecord, LogSource, SourceError};

type Renderer = Box<dyn Fn(&LogRecord) -> String + Send + Sync>;

/// Counters for one pump run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub lines_read: u64,
    pub records_parsed: u64,
    pub records_accepted: u64,
}

impl PumpStats {
    /// Lines that were read but not printed
    pub fn dropped(&self) -> u64 {
        self.lines_read - self.records_accepted
    }
}

/// Pulls raw lines from a source, filters them, and writes the survivors
pub struct LogPump<W> {
    filter: CompiledFilter,
    writer: W,
    render: Renderer,
}

impl<W: AsyncWrite + Unpin> LogPump<W> {
    pub fn new(filter: CompiledFilter, writer: W) -> Self {
        Self {
            filter,
            writer,
            render: Box::new(LogRecord::format_line),
        }
    }

    /// Replace how accepted records are turned into output text
    pub fn with_renderer<F>(mut self, render: F) -> Self
    where
        F: Fn(&LogRecord) -> String + Send + Sync + 'static,
    {
        self.render = Box::new(render);
        self
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Run until the source is exhausted or `cancel` fires
    ///
    /// The source is closed before returning, whatever the outcome.
    pub async fn run(
        &mut self,
        mut source: LogSource,
        cancel: &CancellationToken,
    ) -> Result<PumpStats, SourceError> {
        let result = self.pump(&mut source, cancel).await;
        source.close().await;

        if let Ok(stats) = &result {
            info!(
                read = stats.lines_read,
                parsed = stats.records_parsed,
                accepted = stats.records_accepted,
                dropped = stats.dropped(),
                "log pump finished"
            );
        }
        result
    }

    async fn pump(
        &mut self,
        source: &mut LogSource,
        cancel: &CancellationToken,
    ) -> Result<PumpStats, SourceError> {
        let mut stats = PumpStats::default();

        loop {
            let line = tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!("log pump cancelled");
                    break;
                }

                line = source.next_line() => line?,
            };

            let Some(line) = line else {
                debug!("log source exhausted");
                break;
            };
            stats.lines_read += 1;

            let Some(record) = LogParser::parse(&line) else {
                continue;
            };
            stats.records_parsed += 1;

            if !self.filter.matches(&record) {
                continue;
            }
            stats.records_accepted += 1;

            let rendered = (self.render)(&record);
            if let Err(e) = self.emit(rendered.as_bytes()).await {
                if e.kind() == ErrorKind::BrokenPipe {
                    debug!("output closed");
                    break;
                }
                return Err(SourceError::Output(e));
            }
        }

        Ok(stats)
    }

    async fn emit(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await
    }
}

//! Splitting of the engine's combined log stream into stdout and stderr.
use bollard::{container::LogOutput, errors::Error as BollardError};
use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, trace};

/// Capacity of each in-memory pipe between the demultiplexer and a consumer.
pub(crate) const PIPE_CAPACITY: usize = 64 * 1024;

/// Forward decoded log frames until the stream ends, then close both writers.
///
/// Tty containers emit `Console` frames; those go to stdout. A consumer that
/// drops its reader stops receiving bytes without stalling the other stream.
/// A stream error is logged and treated as end of stream.
pub(crate) async fn pump<S, W>(id: &str, logs: S, stdout: W, stderr: W)
where
    S: Stream<Item = Result<LogOutput, BollardError>>,
    W: AsyncWrite + Unpin,
{
    let mut logs = std::pin::pin!(logs);
    let mut stdout = Some(stdout);
    let mut stderr = Some(stderr);

    while let Some(frame) = logs.next().await {
        match frame {
            Ok(LogOutput::StdOut { message }) | Ok(LogOutput::Console { message }) => {
                forward(id, "stdout", &mut stdout, &message).await;
            }
            Ok(LogOutput::StdErr { message }) => {
                forward(id, "stderr", &mut stderr, &message).await;
            }
            Ok(LogOutput::StdIn { .. }) => {}
            Err(e) => {
                error!(id, error = %e, "error streaming logs from container");
                break;
            }
        }
    }

    trace!(id, "container logging task shutting down");
    for (name, sink) in [("stdout", stdout), ("stderr", stderr)] {
        if let Some(mut sink) = sink {
            if let Err(e) = sink.shutdown().await {
                debug!(id, stream = name, "failed to close pipe: {e}");
            }
        }
    }
}

async fn forward<W>(id: &str, name: &'static str, sink: &mut Option<W>, message: &[u8])
where
    W: AsyncWrite + Unpin,
{
    let Some(writer) = sink.as_mut() else {
        return;
    };
    if let Err(e) = writer.write_all(message).await {
        debug!(id, stream = name, "consumer went away, discarding output: {e}");
        *sink = None;
    }
}

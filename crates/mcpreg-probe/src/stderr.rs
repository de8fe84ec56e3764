//! Bounded capture of a probed process's stderr.
//!
//! A server that fails its handshake usually says why on stderr; the last
//! few lines are kept so they can be attached to the probe result.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Ring buffer of the most recent stderr lines.
#[derive(Debug, Clone)]
pub struct StderrTail {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl StderrTail {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn push(&self, line: String) {
        if self.capacity == 0 {
            return;
        }
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Collected lines, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Collected lines joined for display, or `None` if nothing was captured.
    pub fn render(&self) -> Option<String> {
        let lines = self.snapshot();
        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    /// Drain `stream` line by line into this buffer until EOF.
    pub fn spawn_reader<R>(&self, stream: R) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let tail = self.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::trace!(line = %line, "probe stderr");
                tail.push(line);
            }
        })
    }
}

/// Give a reader `limit` to reach EOF, then abort it.
///
/// A descendant of the probed process can keep the pipe open long after the
/// process itself is gone. Returns `true` if the stream was fully drained.
pub async fn finish_reader(mut reader: JoinHandle<()>, limit: Duration) -> bool {
    if timeout(limit, &mut reader).await.is_ok() {
        return true;
    }
    reader.abort();
    false
}

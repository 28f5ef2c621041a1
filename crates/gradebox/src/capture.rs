//! Diagnostic output capture for one invocation
//!
//! A fresh [`OutputCapture`] is created for every invocation and handed the
//! child's stdout and stderr. Both streams are drained concurrently into
//! buffers owned by that capture only, so nothing written during one case can
//! show up in another. Output past the limit is discarded but still drained,
//! which keeps the child from blocking on a full pipe.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const CHUNK_SIZE: usize = 8192;
const TRUNCATION_MARKER: &str = "[output truncated]";

/// Capture target for a single invocation
#[derive(Debug, Clone, Copy)]
pub struct OutputCapture {
    /// Bytes kept per stream
    limit: usize,
}

impl OutputCapture {
    /// Create a capture keeping at most `limit` bytes per stream (unbounded if `None`)
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit: limit.unwrap_or(usize::MAX),
        }
    }

    /// Start draining the given streams.
    ///
    /// Missing streams are treated as empty.
    pub fn attach<O, E>(self, stdout: Option<O>, stderr: Option<E>) -> CaptureHandle
    where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        CaptureHandle {
            stdout: StreamDrain::spawn(stdout, self.limit),
            stderr: StreamDrain::spawn(stderr, self.limit),
        }
    }
}

/// In-flight capture; call [`finish`](Self::finish) once the child has exited
#[derive(Debug)]
pub struct CaptureHandle {
    stdout: StreamDrain,
    stderr: StreamDrain,
}

impl CaptureHandle {
    /// Wait for both streams to reach EOF and return what was written
    pub async fn finish(mut self) -> std::io::Result<CapturedOutput> {
        self.stdout.join().await?;
        self.stderr.join().await?;
        Ok(self.collect())
    }

    /// Like [`finish`](Self::finish), but give up waiting for EOF after `grace`.
    ///
    /// A stream still open at that point (held by a process that escaped the
    /// kill) is abandoned; whatever was read from it so far is kept.
    pub async fn finish_within(mut self, grace: Duration) -> std::io::Result<CapturedOutput> {
        let joined = tokio::time::timeout(grace, async {
            self.stdout.join().await?;
            self.stderr.join().await
        })
        .await;

        match joined {
            Ok(result) => result?,
            Err(_) => {
                warn!(?grace, "output streams still open, keeping partial capture");
                self.stdout.abort();
                self.stderr.abort();
            }
        }
        Ok(self.collect())
    }

    fn collect(&self) -> CapturedOutput {
        let stdout = self.stdout.lock();
        let stderr = self.stderr.lock();

        let captured = CapturedOutput {
            stdout: String::from_utf8_lossy(&stdout.bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.bytes).into_owned(),
            truncated: stdout.truncated || stderr.truncated,
        };

        debug!(
            stdout_len = captured.stdout.len(),
            stderr_len = captured.stderr.len(),
            truncated = captured.truncated,
            "capture finished"
        );

        captured
    }
}

impl Drop for CaptureHandle {
    // A grandchild can hold the pipes open past the deadline
    fn drop(&mut self) {
        self.stdout.abort();
        self.stderr.abort();
    }
}

/// Everything written during one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    /// Whether either stream hit the capture limit
    pub truncated: bool,
}

impl CapturedOutput {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }

    /// Text reported to the user: stdout, then stderr, then a truncation marker
    pub fn diagnostic_text(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let mut text = self.stdout.clone();
        for part in [self.stderr.as_str(), if self.truncated { TRUNCATION_MARKER } else { "" }] {
            if part.is_empty() {
                continue;
            }
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(part);
        }
        Some(text)
    }

    /// Last non-empty stderr line, used to describe crashes
    pub fn stderr_tail(&self) -> Option<&str> {
        self.stderr.lines().rev().map(str::trim).find(|l| !l.is_empty())
    }
}

#[derive(Debug, Default)]
struct StreamBuffer {
    bytes: Vec<u8>,
    truncated: bool,
}

impl StreamBuffer {
    fn push(&mut self, chunk: &[u8], limit: usize) {
        let room = limit.saturating_sub(self.bytes.len());
        if chunk.len() > room {
            self.truncated = true;
        }
        self.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }
}

/// One stream being drained by a background task into a shared buffer
#[derive(Debug)]
struct StreamDrain {
    buffer: Arc<Mutex<StreamBuffer>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl StreamDrain {
    fn spawn<R>(reader: Option<R>, limit: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(StreamBuffer::default()));
        let task = reader.map(|reader| tokio::spawn(drain(reader, limit, Arc::clone(&buffer))));
        Self { buffer, task }
    }

    async fn join(&mut self) -> std::io::Result<()> {
        match self.task.as_mut() {
            Some(task) => {
                let result = task.await.map_err(std::io::Error::other)?;
                self.task = None;
                result
            }
            None => Ok(()),
        }
    }

    fn abort(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    fn lock(&self) -> MutexGuard<'_, StreamBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn drain<R>(mut reader: R, limit: usize, buffer: Arc<Mutex<StreamBuffer>>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(&chunk[..n], limit);
    }
}

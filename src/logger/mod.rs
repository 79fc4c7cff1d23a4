//! Non-blocking file logger.
//!
//! Producers call [`AsyncLogger::log_event`] from any thread; the line is
//! timestamped and queued, and a single background thread appends it to the
//! file. [`AsyncLogger::close`] drains what is queued and waits a bounded
//! time for the writer to finish.
//!
//! ```rust,no_run
//! use async_logsink::logger::AsyncLogger;
//!
//! let logger = AsyncLogger::open("app.log")?;
//! logger.log_event("Application started");
//! logger.close();
//! # Ok::<(), async_logsink::model::error::LoggerError>(())
//! ```

pub mod diagnostics;
pub mod format;
pub mod queue;
pub mod writer;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::model::error::LoggerError;
use diagnostics::{Diagnostics, StderrDiagnostics};
use queue::HandoffQueue;
use writer::WriterLoop;

pub use diagnostics::MemoryDiagnostics;
pub use format::{format_line, LogLine};

pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Upper bound on how long `close` waits for the writer.
    pub shutdown_timeout: Duration,
    /// `None` keeps the queue unbounded. `Some(n)` keeps at most `n` lines
    /// and drops the oldest on overflow.
    pub max_pending: Option<usize>,
}

impl LoggerConfig {
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_max_pending(mut self, max: usize) -> Self {
        self.max_pending = Some(max);
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            max_pending: None,
        }
    }
}

/// Set once the writer thread has left its loop, even if it panicked.
#[derive(Default)]
struct Completion {
    done: Mutex<bool>,
    cond: Condvar,
}

impl Completion {
    fn finish(&self) {
        *self.done.lock() = true;
        self.cond.notify_all();
    }

    fn wait_for(&self, timeout: Duration) -> bool {
        let mut done = self.done.lock();
        if !*done {
            self.cond.wait_while_for(&mut done, |done| !*done, timeout);
        }
        *done
    }
}

struct FinishOnDrop(Arc<Completion>);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.0.finish();
    }
}

struct Worker {
    handle: JoinHandle<()>,
    completion: Arc<Completion>,
}

pub struct AsyncLogger {
    queue: Arc<HandoffQueue>,
    worker: Mutex<Option<Worker>>,
    diagnostics: Arc<dyn Diagnostics>,
    shutdown_timeout: Duration,
}

impl AsyncLogger {
    /// Opens `path` for append (creating it if needed) and starts the writer.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoggerError> {
        Self::open_with(path, LoggerConfig::default(), Arc::new(StderrDiagnostics))
    }

    pub fn open_with<P: AsRef<Path>>(
        path: P,
        config: LoggerConfig,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self, LoggerError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LoggerError::Open {
                path: path.display().to_string(),
                source,
            })?;

        Self::with_writer(file, config, diagnostics)
    }

    /// Starts a logger over an arbitrary sink instead of a file.
    pub fn with_writer<W>(
        sink: W,
        config: LoggerConfig,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self, LoggerError>
    where
        W: Write + Send + 'static,
    {
        let queue = Arc::new(HandoffQueue::new(config.max_pending));
        let completion = Arc::new(Completion::default());

        let writer = WriterLoop::new(sink, Arc::clone(&queue), Arc::clone(&diagnostics));
        let guard = FinishOnDrop(Arc::clone(&completion));
        let handle = thread::Builder::new()
            .name("async-logger".to_string())
            .spawn(move || {
                let _guard = guard;
                writer.run();
            })
            .map_err(LoggerError::Spawn)?;

        Ok(AsyncLogger {
            queue,
            worker: Mutex::new(Some(Worker { handle, completion })),
            diagnostics,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Timestamps `message` now and queues it. Never blocks on I/O and never
    /// fails; after `close` the message is silently discarded.
    pub fn log_event(&self, message: &str) {
        self.try_log_event(message);
    }

    /// Like `log_event`, but reports whether the line was queued. Returns
    /// `false` only once the writer has done its final drain.
    pub fn try_log_event(&self, message: &str) -> bool {
        let line = format::format_now(message);
        self.queue.push(line)
    }

    /// Number of lines waiting for the writer.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Requests shutdown and waits up to the configured timeout for the
    /// writer to drain and close the file. Safe to call more than once.
    ///
    /// On timeout the writer thread is left running detached; it still owns
    /// the file and releases it when its last write completes.
    pub fn close(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };

        self.queue.cancel();

        if !worker.completion.wait_for(self.shutdown_timeout) {
            self.diagnostics.report(&format!(
                "writer did not finish within {:?}, detaching",
                self.shutdown_timeout
            ));
            return;
        }

        if worker.handle.join().is_err() {
            self.diagnostics.report("writer thread panicked");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.worker.lock().is_none()
    }
}

impl Drop for AsyncLogger {
    fn drop(&mut self) {
        self.close();
    }
}

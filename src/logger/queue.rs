use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use super::format::LogLine;

/// Why the writer was woken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Data,
    Cancelled,
}

/// Lines taken off the queue in one pop-all, plus how many were discarded
/// by the overflow policy since the previous pop.
#[derive(Debug, Default)]
pub struct Drained {
    pub lines: VecDeque<LogLine>,
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct QueueState {
    lines: VecDeque<LogLine>,
    wake_tokens: usize,
    dropped: u64,
    cancelled: bool,
    closed: bool,
}

/// Multi-producer, single-consumer FIFO of formatted lines with a counting
/// wake signal and a one-way cancellation flag.
///
/// Producers only hold the lock for a push. The consumer swaps the whole
/// backlog out in `drain`, so file I/O never happens under the lock.
#[derive(Debug)]
pub struct HandoffQueue {
    state: Mutex<QueueState>,
    wake: Condvar,
    max_pending: Option<usize>,
}

impl HandoffQueue {
    pub fn new(max_pending: Option<usize>) -> Self {
        HandoffQueue {
            state: Mutex::new(QueueState::default()),
            wake: Condvar::new(),
            max_pending: max_pending.map(|n| n.max(1)),
        }
    }

    /// Appends a line and releases one wake token.
    ///
    /// Returns `false` once the queue has been closed by the final drain; the
    /// line is discarded in that case.
    pub fn push(&self, line: LogLine) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }

        if let Some(max) = self.max_pending {
            while state.lines.len() >= max {
                state.lines.pop_front();
                state.dropped += 1;
            }
        }

        state.lines.push_back(line);
        state.wake_tokens += 1;
        drop(state);

        self.wake.notify_one();
        true
    }

    /// Parks the caller until a wake token is available or cancellation has
    /// been requested. Cancellation wins over pending data.
    pub fn wait(&self) -> Wake {
        let mut state = self.state.lock();
        while state.wake_tokens == 0 && !state.cancelled {
            self.wake.wait(&mut state);
        }

        if state.cancelled {
            Wake::Cancelled
        } else {
            state.wake_tokens -= 1;
            Wake::Data
        }
    }

    /// Pops everything currently queued, in push order.
    pub fn drain(&self) -> Drained {
        let mut state = self.state.lock();
        // Every token issued so far is covered by the lines taken here.
        state.wake_tokens = 0;
        Drained {
            lines: std::mem::take(&mut state.lines),
            dropped: std::mem::take(&mut state.dropped),
        }
    }

    /// Last pop-all. Later pushes are rejected.
    pub fn close(&self) -> Drained {
        let mut state = self.state.lock();
        state.closed = true;
        state.wake_tokens = 0;
        Drained {
            lines: std::mem::take(&mut state.lines),
            dropped: std::mem::take(&mut state.dropped),
        }
    }

    /// Requests cancellation and wakes the consumer once. Monotonic.
    pub fn cancel(&self) {
        self.state.lock().cancelled = true;
        self.wake.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    pub fn len(&self) -> usize {
        self.state.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

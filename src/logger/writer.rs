use std::io::{self, Write};
use std::sync::Arc;

use super::diagnostics::Diagnostics;
use super::format::LogLine;
use super::queue::{Drained, HandoffQueue, Wake};

/// The single consumer of the queue. Owns the sink until `run` returns, at
/// which point the sink is dropped (closing the file).
pub struct WriterLoop<W: Write> {
    sink: W,
    queue: Arc<HandoffQueue>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl<W: Write> WriterLoop<W> {
    pub fn new(sink: W, queue: Arc<HandoffQueue>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        WriterLoop {
            sink,
            queue,
            diagnostics,
        }
    }

    /// Idle -> Draining -> (Idle | Terminating). Cancellation is only looked
    /// at between batches, never in the middle of a write.
    pub fn run(mut self) {
        loop {
            let wake = self.queue.wait();

            let batch = self.queue.drain();
            self.write_batch(batch);

            if wake == Wake::Cancelled || self.queue.is_cancelled() {
                break;
            }
        }

        // Picks up anything pushed after the last drain.
        let rest = self.queue.close();
        self.write_batch(rest);

        if let Err(e) = self.sink.flush() {
            self.diagnostics.report(&format!("final flush failed: {}", e));
        }
    }

    fn write_batch(&mut self, batch: Drained) {
        if batch.dropped > 0 {
            self.diagnostics.report(&format!(
                "queue overflow, dropped {} oldest line(s)",
                batch.dropped
            ));
        }

        for line in batch.lines {
            if let Err(e) = self.write_line(&line) {
                self.diagnostics.report(&format!("failed to write line '{}': {}", line, e));
            }
        }
    }

    /// Writes one line plus its newline. If the sink fails after part of
    /// the line went out, the fragment is terminated so the next line still
    /// starts at the beginning of a line.
    fn write_line(&mut self, line: &LogLine) -> io::Result<()> {
        let mut buf = String::with_capacity(line.as_str().len() + 1);
        buf.push_str(line.as_str());
        buf.push('\n');
        let bytes = buf.as_bytes();

        let mut written = 0;
        while written < bytes.len() {
            match self.sink.write(&bytes[written..]) {
                Ok(0) => {
                    let err = io::Error::new(io::ErrorKind::WriteZero, "sink accepted no bytes");
                    return Err(self.abandon_line(written, err));
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(self.abandon_line(written, e)),
            }
        }

        self.sink.flush()
    }

    fn abandon_line(&mut self, written: usize, err: io::Error) -> io::Error {
        if written > 0 {
            if let Err(e) = self.sink.write_all(b"\n") {
                self.diagnostics.report(&format!("cannot terminate partial line: {}", e));
            }
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::diagnostics::MemoryDiagnostics;
    use crate::logger::format::format_now;

    /// Fails every write whose bytes contain `poison`.
    struct PickyWriter {
        written: Vec<u8>,
        poison: &'static str,
    }

    impl Write for PickyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if String::from_utf8_lossy(buf).contains(self.poison) {
                return Err(io::Error::new(io::ErrorKind::Other, "injected"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_line_is_reported_and_rest_of_batch_written() {
        let queue = Arc::new(HandoffQueue::new(None));
        let diag = Arc::new(MemoryDiagnostics::new());
        let mut writer = WriterLoop::new(
            PickyWriter {
                written: Vec::new(),
                poison: "bad",
            },
            Arc::clone(&queue),
            diag.clone(),
        );

        queue.push(format_now("one"));
        queue.push(format_now("bad"));
        queue.push(format_now("two"));
        writer.write_batch(queue.drain());

        let out = String::from_utf8(writer.sink.written.clone()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] one"));
        assert!(lines[1].ends_with("] two"));

        let entries = diag.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].contains("injected"));
    }

    #[test]
    fn run_stops_after_cancel_and_writes_backlog() {
        let queue = Arc::new(HandoffQueue::new(None));
        let diag = Arc::new(MemoryDiagnostics::new());

        queue.push(format_now("a"));
        queue.push(format_now("b"));
        queue.cancel();

        let mut out = Vec::new();
        WriterLoop::new(&mut out, Arc::clone(&queue), diag.clone()).run();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(diag.entries().is_empty());
        assert!(!queue.push(format_now("after")));
    }

    #[test]
    fn overflow_count_goes_to_diagnostics() {
        let queue = Arc::new(HandoffQueue::new(Some(1)));
        let diag = Arc::new(MemoryDiagnostics::new());

        queue.push(format_now("a"));
        queue.push(format_now("b"));
        queue.cancel();

        let mut out = Vec::new();
        WriterLoop::new(&mut out, Arc::clone(&queue), diag.clone()).run();

        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
        assert_eq!(diag.entries(), vec!["queue overflow, dropped 1 oldest line(s)"]);
    }
}

//! Side channel for problems inside the logger itself.
//!
//! Nothing reported here is ever written back into the log file.

use parking_lot::Mutex;

pub trait Diagnostics: Send + Sync + 'static {
    fn report(&self, message: &str);
}

/// Default channel: one line per problem on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrDiagnostics;

impl Diagnostics for StderrDiagnostics {
    fn report(&self, message: &str) {
        eprintln!("AsyncLogger error: {}", message);
    }
}

/// Keeps every report in memory. Useful in tests.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    entries: Mutex<Vec<String>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn report(&self, message: &str) {
        self.entries.lock().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_diagnostics_records_in_order() {
        let diag = MemoryDiagnostics::new();
        diag.report("first");
        diag.report("second");
        assert_eq!(diag.entries(), vec!["first", "second"]);
    }

    #[test]
    fn stderr_diagnostics_does_not_panic() {
        StderrDiagnostics.report("ignored");
    }
}

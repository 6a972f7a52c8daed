use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// Build the discovery line for one extension type.
pub fn discovery_message(framework: &str, extension: &str) -> String {
    format!("Discovered {framework} extension {extension}")
}

/// Operator-visible channel that receives discovery notifications.
pub trait DiscoverySink: Send + Sync {
    fn notify(&self, message: &str);
}

/// Writes each notification as a line on the process's stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl DiscoverySink for StderrSink {
    fn notify(&self, message: &str) {
        let mut stderr = std::io::stderr().lock();
        // Diagnostics only; a closed stderr must not fail extension loading.
        let _ = writeln!(stderr, "{message}");
    }
}

/// Keeps notifications in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DiscoverySink for MemorySink {
    fn notify(&self, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

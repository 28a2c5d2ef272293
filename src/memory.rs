// SPDX-License-Identifier: MIT OR Apache-2.0

//! # In-memory console
//!
//! [`MemoryWriter`] is a console sink that keeps everything written to it, for tests and for
//! hosts that want to inspect log output programmatically.
//!
//! ```
//! use logstack::{args, Logger, MemoryWriter};
//!
//! let memory = MemoryWriter::new();
//! let logger = Logger::new(None, None);
//! logger.to_console_writer(memory.clone());
//! logger.info(args!["hello ", 3]);
//!
//! let logs = memory.drain_logs();
//! assert!(logs.ends_with("hello [3]\n"));
//! assert_eq!(memory.drain_logs(), "");
//! ```

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/**
A cloneable, thread-safe byte buffer implementing [`Write`].

Clones share the same buffer, so one clone can be handed to a logger while another is kept
to read back what was logged.
*/
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, leaving the buffer intact.
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Everything written so far, clearing the buffer.
    pub fn drain_logs(&self) -> String {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        let logs = String::from_utf8_lossy(&buffer).into_owned();
        buffer.clear();
        logs
    }

    /// The buffered text split into lines, clearing the buffer.
    pub fn drain_lines(&self) -> Vec<String> {
        self.drain_logs().lines().map(str::to_string).collect()
    }

    /// Writes every buffered line to stderr, clearing the buffer.
    pub fn drain_to_console(&self) {
        for line in self.drain_lines() {
            eprintln!("{}", line);
        }
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug/Clone/Default: derived. Clone shares the buffer, which is the point.
// - PartialEq/Eq/Hash: NOT implemented - equality of a shared mutable buffer is unclear.
// - Display: NOT implemented - use contents() instead.
// - Send/Sync: automatic through Arc<Mutex<_>>.

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Where console output goes.

use std::fmt::Debug;
use std::io::Write;

/**
A console destination for a [`Logger`](crate::Logger).

[`Console::Stdout`] is what [`Logger::to_console`](crate::Logger::to_console) selects.
*/
pub enum Console {
    Stdout,
    Stderr,
    Writer(Box<dyn Write + Send>),
}

impl Console {
    /// Writes `text` in one locked call so lines from other threads do not interleave.
    pub(crate) fn write_text(&mut self, text: &str) -> std::io::Result<()> {
        match self {
            Console::Stdout => {
                let mut lock = std::io::stdout().lock();
                lock.write_all(text.as_bytes())?;
                lock.flush()
            }
            Console::Stderr => {
                let mut lock = std::io::stderr().lock();
                lock.write_all(text.as_bytes())
            }
            Console::Writer(writer) => {
                writer.write_all(text.as_bytes())?;
                writer.flush()
            }
        }
    }

    pub(crate) fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Console::Stdout => std::io::stdout().lock().flush(),
            Console::Stderr => Ok(()),
            Console::Writer(writer) => writer.flush(),
        }
    }
}

impl Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Console::Stdout => f.write_str("Stdout"),
            Console::Stderr => f.write_str("Stderr"),
            Console::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Console::Stdout
    }
}

/*
Boilerplate notes.

Debug is hand-written since the boxed writer is opaque.
Clone, PartialEq, Hash: a boxed writer has none of these.
Default is stdout, the same as to_console().
*/

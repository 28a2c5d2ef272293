// SPDX-License-Identifier: MIT OR Apache-2.0

//! A stack of loggers with one "current" logger.
//!
//! Long-running processes sometimes want a region of work, such as one request or one job, to
//! log somewhere of its own and then go back to what was there before. [`LoggerStack`] keeps the
//! loggers in push order; the last one pushed is current, and every logging call made on the
//! stack goes to it.
//!
//! # Default behavior
//!
//! Logging through an empty stack never goes nowhere: [`LoggerStack::get`] pushes an INFO
//! logger writing to the fallback file ([`FALLBACK_FILE`]) first.
//!
//! # Examples
//!
//! ```
//! use logstack::{args, Level, LoggerStack, MemoryWriter};
//!
//! let stack = LoggerStack::new();
//! let base = MemoryWriter::new();
//! stack.push(None).to_console_writer(base.clone());
//!
//! let request = MemoryWriter::new();
//! let scoped = stack.push(Some(Level::DEBUG));
//! scoped.to_console_writer(request.clone());
//! stack.debug(args!["only in the request log"]);
//! let popped = stack.pop().unwrap();
//! assert!(std::sync::Arc::ptr_eq(&popped, &scoped));
//!
//! stack.info(args!["back to the base log"]);
//! assert!(request.drain_logs().contains("only in the request log"));
//! assert!(base.drain_logs().contains("back to the base log"));
//! ```
//!
//! # Thread safety
//!
//! One mutex guards the sequence, so `push`, `pop`, `close` and `get` are linearizable. The
//! lock is released before any logging I/O happens.

use crate::directory::Directory;
use crate::format::Arg;
use crate::level::Level;
use crate::logger::Logger;
use crate::macros::all_level_methods;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// The file the lazily created default logger writes to.
pub const FALLBACK_FILE: &str = "limbo";

#[derive(Debug, Default)]
pub struct LoggerStack {
    loggers: Mutex<Vec<Arc<Logger>>>,
    directory: Option<Arc<dyn Directory>>,
}

impl LoggerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stack whose loggers resolve file names through `directory`.
    pub fn with_directory(directory: Arc<dyn Directory>) -> Self {
        LoggerStack {
            loggers: Mutex::new(Vec::new()),
            directory: Some(directory),
        }
    }

    fn loggers(&self) -> MutexGuard<'_, Vec<Arc<Logger>>> {
        self.loggers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_logger(&self, level: Option<Level>) -> Arc<Logger> {
        Arc::new(Logger::new(level, self.directory.clone()))
    }

    /**
    The current logger, pushing a default one first if the stack is empty.

    The default logger is at INFO and writes to [`FALLBACK_FILE`].
    */
    pub fn get(&self) -> Arc<Logger> {
        let mut loggers = self.loggers();
        if let Some(top) = loggers.last() {
            return top.clone();
        }
        let logger = self.new_logger(None);
        logger.to_file(FALLBACK_FILE);
        loggers.push(logger.clone());
        logger
    }

    /// The current logger without creating one.
    pub fn top(&self) -> Option<Arc<Logger>> {
        self.loggers().last().cloned()
    }

    /// Pushes a new logger with no outputs configured and makes it current.
    pub fn push(&self, level: Option<Level>) -> Arc<Logger> {
        let logger = self.new_logger(level);
        self.loggers().push(logger.clone());
        logger
    }

    /// Pushes an existing logger and makes it current.
    pub fn push_logger(&self, logger: Arc<Logger>) -> Arc<Logger> {
        self.loggers().push(logger.clone());
        logger
    }

    /// Removes and returns the current logger. The one below it, if any, becomes current.
    pub fn pop(&self) -> Option<Arc<Logger>> {
        self.loggers().pop()
    }

    /// Closes every logger and empties the stack.
    pub fn close(&self) {
        let drained: Vec<_> = self.loggers().drain(..).collect();
        for logger in drained {
            logger.close();
        }
    }

    pub fn len(&self) -> usize {
        self.loggers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers().is_empty()
    }

    /// The current logger's level, first setting it when a level is supplied.
    pub fn level(&self, level: impl Into<Option<Level>>) -> Level {
        self.get().level(level)
    }

    /// Logs through the current logger.
    pub fn log(&self, level: Level, args: &[Arg<'_>]) {
        self.get().log(level, args)
    }

    all_level_methods!();
}

static GLOBAL_STACK: OnceLock<LoggerStack> = OnceLock::new();

/**
A process-wide stack for hosts that rely on ambient context.

Prefer constructing a [`LoggerStack`] and passing it around; this exists for code that cannot.

```
use logstack::global_stack;

let depth = global_stack().len();
let logger = global_stack().push(None);
assert!(std::sync::Arc::ptr_eq(&global_stack().pop().unwrap(), &logger));
assert_eq!(global_stack().len(), depth);
```
*/
pub fn global_stack() -> &'static LoggerStack {
    GLOBAL_STACK.get_or_init(LoggerStack::new)
}

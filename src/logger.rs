// SPDX-License-Identifier: MIT OR Apache-2.0

//! The logger.
//!
//! A [`Logger`] owns one stream of log output: a minimum level, an optional console sink and an
//! optional daily-rotated file. Each call to [`Logger::log`] (or one of the per-level methods):
//!
//! 1. drops the message if it is less urgent than the configured level;
//! 2. drops it if there is neither a console nor a file to write to;
//! 3. renders the arguments (see [`format`](crate::format));
//! 4. prefixes every non-blank line with `HH:MM:SS [pid][level]: Caller::function(): `;
//! 5. appends the text to today's file and/or the console.
//!
//! Logging never fails from the caller's point of view. I/O problems are kept and can be
//! inspected with [`Logger::take_last_error`].
//!
//! ```
//! use logstack::{args, Level, Logger, MemoryWriter};
//!
//! let memory = MemoryWriter::new();
//! let logger = Logger::new(Some(Level::NOTICE), None);
//! logger.to_console_writer(memory.clone());
//!
//! logger.warning(args!["disk at ", 91, "%"]);
//! logger.info(args!["not recorded"]);
//!
//! let lines = memory.drain_lines();
//! assert_eq!(lines.len(), 1);
//! assert!(lines[0].ends_with("disk at [91]%"));
//! ```

use crate::caller::CallerResolver;
use crate::clock::{Clock, SystemClock};
use crate::console::Console;
use crate::directory::Directory;
use crate::error::LogError;
use crate::format::{Arg, render};
use crate::level::Level;
use crate::macros::all_level_methods;
use crate::rotation::FileRotator;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct Logger {
    level: AtomicU8,
    console: Mutex<Option<Console>>,
    file: Mutex<FileRotator>,
    directory: Option<Arc<dyn Directory>>,
    resolver: CallerResolver,
    clock: Arc<dyn Clock>,
    last_error: Mutex<Option<LogError>>,
}

impl Logger {
    /**
    Creates a logger at `level` (INFO when `None`) with no outputs configured.

    When `directory` is given, names passed to [`to_file`](Self::to_file) are resolved through it.
    */
    pub fn new(level: Option<Level>, directory: Option<Arc<dyn Directory>>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Logger {
            level: AtomicU8::new(level.unwrap_or_default().value()),
            console: Mutex::new(None),
            file: Mutex::new(FileRotator::new(clock.clone())),
            directory,
            resolver: CallerResolver::default(),
            clock,
            last_error: Mutex::new(None),
        }
    }

    /// Replaces the time source. Any open file is closed.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        let rotator = self.file.get_mut().unwrap_or_else(PoisonError::into_inner);
        let base = rotator.base().map(PathBuf::from);
        let mut replacement = FileRotator::new(clock.clone());
        if let Some(base) = base {
            let result = replacement.retarget(base);
            self.record(result);
        }
        *self.file.get_mut().unwrap_or_else(PoisonError::into_inner) = replacement;
        self.clock = clock;
        self
    }

    /// Replaces the caller resolver, e.g. to extend its skip set.
    pub fn with_resolver(mut self, resolver: CallerResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /**
    Returns the minimum level, first setting it when a level is supplied.

    ```
    use logstack::{Level, Logger};

    let logger = Logger::new(None, None);
    assert_eq!(logger.level(None), Level::INFO);
    assert_eq!(logger.level(Level::DEBUG3), Level::DEBUG3);
    assert_eq!(logger.level(None), Level::DEBUG3);
    ```
    */
    pub fn level(&self, level: impl Into<Option<Level>>) -> Level {
        if let Some(level) = level.into() {
            self.level.store(level.value(), Ordering::Relaxed);
        }
        Level::new(self.level.load(Ordering::Relaxed))
    }

    /// Sends output to stdout, in addition to any file.
    pub fn to_console(&self) -> &Self {
        self.set_console(Console::Stdout)
    }

    /// Sends console output to stderr instead of stdout.
    pub fn to_stderr(&self) -> &Self {
        self.set_console(Console::Stderr)
    }

    /// Sends console output to `writer`, e.g. a [`MemoryWriter`](crate::MemoryWriter).
    pub fn to_console_writer(&self, writer: impl Write + Send + 'static) -> &Self {
        self.set_console(Console::Writer(Box::new(writer)))
    }

    fn set_console(&self, console: Console) -> &Self {
        *lock(&self.console) = Some(console);
        self
    }

    pub fn has_console(&self) -> bool {
        lock(&self.console).is_some()
    }

    /**
    Sends output to the daily file for `name`, closing any file open before.

    If a name cannot be resolved, the logger is left without a file target and the error is
    kept for [`take_last_error`](Self::take_last_error).
    */
    pub fn to_file(&self, name: &str) -> &Self {
        let resolved = match &self.directory {
            Some(directory) => directory.resolve(name),
            None => Ok(PathBuf::from(name)),
        };
        let mut rotator = lock(&self.file);
        match resolved {
            Ok(path) => {
                let result = rotator.retarget(path);
                self.record(result);
            }
            Err(e) => {
                let result = rotator.close();
                *rotator = FileRotator::new(self.clock.clone());
                self.record(result);
                self.record(Err(e));
            }
        }
        self
    }

    /// The resolved base path of the file target, if any.
    pub fn file_target(&self) -> Option<PathBuf> {
        lock(&self.file).base().map(PathBuf::from)
    }

    /// Whether a dated file is currently open.
    pub fn has_open_file(&self) -> bool {
        lock(&self.file).is_open()
    }

    /// Flushes pending output, keeping the file open.
    pub fn flush(&self) {
        let result = lock(&self.file).flush();
        self.record(result);
        if let Some(console) = lock(&self.console).as_mut() {
            let result = console.flush().map_err(|e| LogError::io("<console>", e));
            self.record(result);
        }
    }

    /// Flushes pending output and releases the open file. A later write reopens it.
    pub fn close(&self) {
        let result = lock(&self.file).close();
        self.record(result);
        if let Some(console) = lock(&self.console).as_mut() {
            let result = console.flush().map_err(|e| LogError::io("<console>", e));
            self.record(result);
        }
    }

    /// The most recent I/O or resolution error, clearing it.
    pub fn take_last_error(&self) -> Option<LogError> {
        lock(&self.last_error).take()
    }

    fn record(&self, result: Result<(), LogError>) {
        if let Err(e) = result {
            *lock(&self.last_error) = Some(e);
        }
    }

    /**
    Logs `args` at `level`.

    Never panics or returns an error for I/O trouble; see the module documentation.
    */
    pub fn log(&self, level: Level, args: &[Arg<'_>]) {
        if !self.level(None).allows(level) {
            return;
        }
        let has_file = lock(&self.file).base().is_some();
        let has_console = self.has_console();
        if !has_file && !has_console {
            return;
        }

        let body = render(level, args);
        if body.trim().is_empty() {
            return;
        }
        let frames = self.resolver.capture();
        let prefix = self.resolver.resolve_prefix(&frames, level, self.clock.now());
        let text = assemble_lines(&prefix, &body);

        if has_file {
            let result = lock(&self.file).write(&text);
            self.record(result);
        }
        if has_console {
            if let Some(console) = lock(&self.console).as_mut() {
                let result = console
                    .write_text(&text)
                    .map_err(|e| LogError::io("<console>", e));
                self.record(result);
            }
        }
    }

    all_level_methods!();
}

/**
Prefixes every non-blank line of `body`, terminating each with `\n`.

```
use logstack::assemble_lines;

assert_eq!(assemble_lines("> ", "a\n  \nb"), "> a\n> b\n");
assert_eq!(assemble_lines("> ", "\n \t\n"), "");
```
*/
pub fn assemble_lines(prefix: &str, body: &str) -> String {
    let mut out = String::new();
    for line in body.split('\n') {
        if line.trim().is_empty() {
            continue;
        }
        out.push_str(prefix);
        out.push_str(line);
        out.push('\n');
    }
    out
}

/*
Boilerplate notes.

Logger holds a file handle and a console sink; Clone would either share or duplicate those,
neither of which is obviously right.  Share through Arc instead.
PartialEq/Hash: identity is what matters; compare Arc pointers.
Default: Logger::new(None, None) is a reasonable default but silently drops everything,
so we make callers spell it out.
*/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::clock::ManualClock;
    use crate::format::{ErrorValue, SourceLocation};
    use crate::memory::MemoryWriter;
    use chrono::{Local, TimeZone};

    struct Job;

    impl Job {
        fn run(&self, logger: &Logger) {
            logger.notice(args!["job ", 7, " done"]);
        }
    }

    struct ThreeLines;

    impl ErrorValue for ThreeLines {
        fn location(&self) -> SourceLocation {
            SourceLocation {
                file: "jobs.rs".to_string(),
                line: 3,
            }
        }
        fn message(&self) -> String {
            "bad".to_string()
        }
        fn trace(&self) -> String {
            "#0 one()\n   \n#1 {main}".to_string()
        }
    }

    fn captured(level: Option<Level>) -> (Logger, MemoryWriter) {
        let memory = MemoryWriter::new();
        let logger = Logger::new(level, None);
        logger.to_console_writer(memory.clone());
        (logger, memory)
    }

    #[test]
    fn gate_by_level() {
        let (logger, memory) = captured(Some(Level::WARNING));
        logger.log(Level::NOTICE, args!["dropped"]);
        logger.log(Level::WARNING, args!["kept"]);
        logger.log(Level::EMERGENCY, args!["kept too"]);
        let lines = memory.drain_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("kept"));
        assert!(lines[1].ends_with("kept too"));
    }

    #[test]
    fn gate_holds_for_every_pair() {
        for configured in 0..=14u8 {
            for message in 0..=14u8 {
                let (logger, memory) = captured(Some(Level::new(configured)));
                logger.log(Level::new(message), args!["x"]);
                let wrote = !memory.drain_logs().is_empty();
                assert_eq!(wrote, message <= configured, "{configured} vs {message}");
            }
        }
    }

    #[test]
    fn unconfigured_logger_writes_nothing() {
        let logger = Logger::new(Some(Level::DEBUG7), None);
        logger.emergency(args!["nobody hears this"]);
        assert!(!logger.has_open_file());
        assert!(logger.file_target().is_none());
        assert!(logger.take_last_error().is_none());
    }

    #[test]
    fn prefix_shape() {
        let (logger, memory) = captured(None);
        let logger = logger.with_clock(Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        )));
        Job.run(&logger);
        let line = memory.drain_logs();
        let expected_head = format!("03:04:05 [{}][5]: ", std::process::id());
        assert!(line.starts_with(&expected_head), "{line:?}");
        assert!(line.ends_with("Job::run(): job [7] done\n"), "{line:?}");
    }

    #[test]
    fn every_line_gets_the_prefix() {
        let (logger, memory) = captured(None);
        let error = ThreeLines;
        logger.error(args![Arg::error(&error)]);
        let lines = memory.drain_lines();
        assert_eq!(lines.len(), 3);
        let prefix_len = lines[0].find("Exception").unwrap();
        let prefix = &lines[0][..prefix_len];
        assert!(prefix.ends_with("(): "));
        assert_eq!(lines[1], format!("{prefix}#0 one()"));
        assert_eq!(lines[2], format!("{prefix}#1 {{main}}"));
    }

    #[test]
    fn blank_message_writes_nothing() {
        let (logger, memory) = captured(None);
        logger.info(args!["  \n\t"]);
        logger.info(&[]);
        assert_eq!(memory.drain_logs(), "");
    }

    #[test]
    fn level_sugar_uses_fixed_levels() {
        let (logger, memory) = captured(Some(Level::DEBUG7));
        logger.trace(args!["t"]);
        logger.debug7(args!["d"]);
        logger.crit(args!["c"]);
        let logs = memory.drain_logs();
        assert!(logs.contains("][8]: "));
        assert!(logs.contains("][14]: "));
        assert!(logs.contains("][2]: "));
    }

    #[test]
    fn unresolvable_name_leaves_no_file_target() {
        let dir = tempfile::tempdir().unwrap();
        let directory: Arc<dyn Directory> = Arc::new(crate::LogDirectory::new(dir.path()));
        let logger = Logger::new(None, Some(directory));
        logger.to_file("../outside");
        assert!(logger.file_target().is_none());
        assert!(matches!(
            logger.take_last_error(),
            Some(LogError::Resolve { .. })
        ));
    }

    #[test]
    fn file_and_console_both_receive() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        ));
        let directory: Arc<dyn Directory> = Arc::new(crate::LogDirectory::new(dir.path()));
        let memory = MemoryWriter::new();
        let logger = Logger::new(None, Some(directory)).with_clock(clock);
        logger.to_file("svc").to_console_writer(memory.clone());
        logger.info(args!["both"]);
        logger.close();

        let file = std::fs::read_to_string(dir.path().join("svc.20240601")).unwrap();
        assert_eq!(file, memory.drain_logs());
        assert!(file.ends_with("both\n"));
        assert!(logger.take_last_error().is_none());
    }

    #[test]
    fn write_failure_is_swallowed_and_console_still_works() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not dir").unwrap();
        let (logger, memory) = captured(None);
        logger.to_file(blocker.join("app").to_str().unwrap());
        logger.error(args!["still visible"]);
        assert!(memory.drain_logs().ends_with("still visible\n"));
        assert!(matches!(logger.take_last_error(), Some(LogError::Io { .. })));
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bridge from the `log` crate.
//!
//! Libraries that log through `log::warn!` and friends can be routed into whichever logger is
//! current on a [`LoggerStack`]. Call sites keep their own prefixes: the bridge and the `log`
//! crate's frames are skipped during caller resolution.
//!
//! | `log` level | [`Level`]            |
//! |-------------|----------------------|
//! | `Error`     | [`Level::ERROR`]     |
//! | `Warn`      | [`Level::WARNING`]   |
//! | `Info`      | [`Level::INFO`]      |
//! | `Debug`     | [`Level::DEBUG`]     |
//! | `Trace`     | [`Level::DEBUG1`]    |
//!
//! ```no_run
//! logstack::init_log_facade(logstack::global_stack()).unwrap();
//! log::info!("now routed through the stack");
//! ```

use crate::format::Arg;
use crate::level::Level;
use crate::stack::LoggerStack;

/// Implements [`log::Log`] on top of a stack.
#[derive(Debug, Clone, Copy)]
pub struct StackFacade {
    stack: &'static LoggerStack,
}

impl StackFacade {
    pub const fn new(stack: &'static LoggerStack) -> Self {
        StackFacade { stack }
    }

    pub fn level_for(level: log::Level) -> Level {
        match level {
            log::Level::Error => Level::ERROR,
            log::Level::Warn => Level::WARNING,
            log::Level::Info => Level::INFO,
            log::Level::Debug => Level::DEBUG,
            log::Level::Trace => Level::DEBUG1,
        }
    }
}

impl log::Log for StackFacade {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.stack
            .get()
            .level(None)
            .allows(Self::level_for(metadata.level()))
    }

    fn log(&self, record: &log::Record<'_>) {
        self.stack.log(
            Self::level_for(record.level()),
            &[Arg::display(record.args())],
        );
    }

    fn flush(&self) {
        if let Some(top) = self.stack.top() {
            top.flush();
        }
    }
}

/**
Installs a [`StackFacade`] for `stack` as the `log` crate's global logger.

Fails if another logger was installed first. The `log` max level is opened fully; filtering
happens in the current logger.
*/
pub fn init_log_facade(stack: &'static LoggerStack) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(StackFacade::new(stack)))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

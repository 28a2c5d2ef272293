// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment-driven logger setup.
//!
//! | Variable           | Meaning                                           |
//! |--------------------|---------------------------------------------------|
//! | `LOGSTACK_LEVEL`   | level name, alias, or number (`notice`, `warn`, `7`) |
//! | `LOGSTACK_CONSOLE` | `1`, `true` or `yes` enables stdout output        |
//! | `LOGSTACK_FILE`    | logical file name for the daily log               |
//!
//! Unparseable values leave the default in place.

use crate::directory::Directory;
use crate::level::Level;
use crate::logger::Logger;
use std::sync::Arc;

pub const LEVEL_VAR: &str = "LOGSTACK_LEVEL";
pub const CONSOLE_VAR: &str = "LOGSTACK_CONSOLE";
pub const FILE_VAR: &str = "LOGSTACK_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub level: Level,
    pub console: bool,
    pub file: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            level: Level::INFO,
            console: false,
            file: None,
        }
    }
}

impl LoggerConfig {
    /// Reads the `LOGSTACK_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /**
    Like [`from_env`](Self::from_env), reading variables through `lookup`.

    ```
    use logstack::{Level, LoggerConfig};

    let config = LoggerConfig::from_vars(|name| match name {
        "LOGSTACK_LEVEL" => Some("debug".to_string()),
        "LOGSTACK_CONSOLE" => Some("yes".to_string()),
        _ => None,
    });
    assert_eq!(config.level, Level::DEBUG);
    assert!(config.console);
    assert_eq!(config.file, None);
    ```
    */
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup(LEVEL_VAR) {
            if let Ok(level) = val.trim().parse() {
                config.level = level;
            }
        }

        if let Some(val) = lookup(CONSOLE_VAR) {
            config.console = matches!(
                val.trim().to_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }

        if let Some(val) = lookup(FILE_VAR) {
            let val = val.trim();
            if !val.is_empty() {
                config.file = Some(val.to_string());
            }
        }

        config
    }

    /// A logger with this configuration's level and outputs.
    pub fn build(&self, directory: Option<Arc<dyn Directory>>) -> Logger {
        let logger = Logger::new(Some(self.level), directory);
        if self.console {
            logger.to_console();
        }
        if let Some(file) = &self.file {
            logger.to_file(file);
        }
        logger
    }
}

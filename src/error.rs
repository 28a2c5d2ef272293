// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while configuring or writing logs.
//!
//! None of these reach a caller of [`Logger::log`](crate::Logger::log); logging is best-effort.
//! They surface from configuration parsing and from [`Logger::take_last_error`](crate::Logger::take_last_error).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot resolve log file {name:?}: {reason}")]
    Resolve { name: String, reason: String },

    #[error("unknown log level {0:?}")]
    UnknownLevel(String),
}

impl LogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LogError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = LogError> = std::result::Result<T, E>;

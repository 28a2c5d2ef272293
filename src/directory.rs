// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping logical log names to paths.
//!
//! A [`Logger`](crate::Logger) given a [`Directory`] passes every name handed to
//! [`to_file`](crate::Logger::to_file) through it. Without one, the name is used as a path as-is.

use crate::error::{LogError, Result};
use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};

/// Resolves a logical file name to a full path.
pub trait Directory: Debug + Send + Sync {
    fn resolve(&self, name: &str) -> Result<PathBuf>;
}

/**
A [`Directory`] that places every log under one root.

Names must be relative and may not climb out of the root.

```
use logstack::{Directory, LogDirectory};

let logs = LogDirectory::new("/var/log/app");
assert_eq!(logs.resolve("worker").unwrap(), std::path::Path::new("/var/log/app/worker"));
assert!(logs.resolve("../etc/passwd").is_err());
```
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogDirectory {
    root: PathBuf,
}

impl LogDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LogDirectory { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Directory for LogDirectory {
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes {
            return Err(LogError::Resolve {
                name: name.to_string(),
                reason: format!("must be a relative path inside {}", self.root.display()),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_under_root() {
        let dir = LogDirectory::new("/srv/logs");
        assert_eq!(
            dir.resolve("jobs/nightly").unwrap(),
            PathBuf::from("/srv/logs/jobs/nightly")
        );
    }

    #[test]
    fn rejects_escapes_and_empty_names() {
        let dir = LogDirectory::new("/srv/logs");
        assert!(matches!(dir.resolve(""), Err(LogError::Resolve { .. })));
        assert!(dir.resolve("/etc/shadow").is_err());
        assert!(dir.resolve("a/../../b").is_err());
    }
}

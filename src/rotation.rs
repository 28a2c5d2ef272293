// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily log files.
//!
//! A [`FileRotator`] pointed at a base path `P` writes to `P.YYYYMMDD` for the current day and
//! keeps a symlink `P.today` pointing at that file's basename. Whenever a write finds the open
//! file belongs to another day (or nothing is open), it rotates first:
//!
//! 1. the dated file is created if missing, with mode `0660`;
//! 2. `P.today` is repointed unless it already names the dated file. The new link is made under
//!    a temporary name and renamed over the old one, so readers never see it missing;
//! 3. the dated file is opened for appending.
//!
//! ```no_run
//! use logstack::{FileRotator, SystemClock};
//! use std::sync::Arc;
//!
//! let mut rotator = FileRotator::new(Arc::new(SystemClock));
//! rotator.retarget("/var/log/app/worker".into()).unwrap();
//! rotator.write("hello\n").unwrap();
//! // /var/log/app/worker.20240309 now ends with "hello", and worker.today points at it
//! ```

use crate::clock::Clock;
use crate::error::{LogError, Result};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y%m%d";
const LINK_SUFFIX: &str = "today";

#[derive(Debug)]
pub struct FileRotator {
    base: Option<PathBuf>,
    date: String,
    file: Option<File>,
    opens: u64,
    clock: Arc<dyn Clock>,
}

impl FileRotator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        FileRotator {
            base: None,
            date: String::new(),
            file: None,
            opens: 0,
            clock,
        }
    }

    fn today(&self) -> String {
        self.clock.now().format(DATE_FORMAT).to_string()
    }

    /**
    Points the rotator at a new base path, closing whatever was open.

    Nothing is created until the next write.
    */
    pub fn retarget(&mut self, base: PathBuf) -> Result<()> {
        let closed = self.close();
        self.base = Some(base);
        self.date = self.today();
        closed
    }

    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    /// The date (`YYYYMMDD`) of the file that is open, or of the last retarget.
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// How many times a dated file has been opened.
    pub fn open_count(&self) -> u64 {
        self.opens
    }

    /// `P.<date>` for the current date.
    pub fn dated_path(&self) -> Option<PathBuf> {
        self.base.as_deref().map(|base| with_suffix(base, &self.date))
    }

    /// `P.today`.
    pub fn link_path(&self) -> Option<PathBuf> {
        self.base.as_deref().map(|base| with_suffix(base, LINK_SUFFIX))
    }

    fn needs_rotation(&self) -> bool {
        self.file.is_none() || self.date != self.today()
    }

    /**
    Switches to today's file, creating it and repointing the link as needed.

    A rotator with no base path does nothing. A link that cannot be repointed does not stop the
    dated file from opening; its error is returned once the file is open.
    */
    pub fn rotate(&mut self) -> Result<()> {
        let Some(base) = self.base.clone() else {
            return Ok(());
        };
        let closed = self.close();
        self.date = self.today();
        let dated = with_suffix(&base, &self.date);
        let link = with_suffix(&base, LINK_SUFFIX);

        if let Some(parent) = dated.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LogError::io(parent, e))?;
        }
        create_restricted(&dated)?;
        let linked = match dated.file_name() {
            Some(name) => repoint_link(&link, Path::new(name)),
            None => Ok(()),
        };
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&dated)
            .map_err(|e| LogError::io(&dated, e))?;
        self.file = Some(file);
        self.opens += 1;
        closed.and(linked)
    }

    /**
    Appends `text` to today's file, rotating first if needed.

    The text is written whenever the dated file could be opened, even if rotation reported an
    error along the way; that error is still returned.
    */
    pub fn write(&mut self, text: &str) -> Result<()> {
        if self.base.is_none() {
            return Ok(());
        }
        let rotated = if self.needs_rotation() {
            self.rotate()
        } else {
            Ok(())
        };
        let path = self.dated_path().unwrap_or_default();
        match self.file.as_mut() {
            Some(file) => file
                .write_all(text.as_bytes())
                .map_err(|e| LogError::io(path, e))
                .and(rotated),
            None => rotated,
        }
    }

    /// Flushes the open file, keeping it open.
    pub fn flush(&mut self) -> Result<()> {
        let path = self.dated_path().unwrap_or_default();
        match self.file.as_mut() {
            Some(file) => file.flush().map_err(|e| LogError::io(path, e)),
            None => Ok(()),
        }
    }

    /// Flushes and releases the open file, if any.
    pub fn close(&mut self) -> Result<()> {
        match self.file.take() {
            Some(mut file) => {
                let path = self.dated_path().unwrap_or_default();
                file.flush().map_err(|e| LogError::io(path, e))
            }
            None => Ok(()),
        }
    }
}

impl Drop for FileRotator {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(unix)]
fn create_restricted(path: &Path) -> Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o660)
        .open(path)
    {
        // the umask may have narrowed the mode on creation
        Ok(_) => fs::set_permissions(path, fs::Permissions::from_mode(0o660))
            .map_err(|e| LogError::io(path, e)),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(LogError::io(path, e)),
    }
}

#[cfg(not(unix))]
fn create_restricted(path: &Path) -> Result<()> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(LogError::io(path, e)),
    }
}

#[cfg(unix)]
fn repoint_link(link: &Path, target: &Path) -> Result<()> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static LINK_ID: AtomicU64 = AtomicU64::new(0);

    if fs::read_link(link).is_ok_and(|current| current == target) {
        return Ok(());
    }
    let mut staging = OsString::from(".");
    staging.push(link.file_name().unwrap_or_default());
    staging.push(format!(
        ".{}.{}",
        std::process::id(),
        LINK_ID.fetch_add(1, Ordering::Relaxed)
    ));
    let staging = link.with_file_name(staging);
    let _ = fs::remove_file(&staging);
    std::os::unix::fs::symlink(target, &staging).map_err(|e| LogError::io(&staging, e))?;
    fs::rename(&staging, link).map_err(|e| {
        let _ = fs::remove_file(&staging);
        LogError::io(link, e)
    })
}

#[cfg(not(unix))]
fn repoint_link(_link: &Path, _target: &Path) -> Result<()> {
    //no portable atomic symlink replacement; the dated files are still written
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Local, TimeZone};
    use std::os::unix::fs::PermissionsExt;

    fn clock_at(day: u32) -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn first_write_creates_file_and_link() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("app");
        let mut rotator = FileRotator::new(clock_at(9));
        rotator.retarget(base.clone()).unwrap();
        assert!(!rotator.is_open());

        rotator.write("one\n").unwrap();
        rotator.close().unwrap();

        let dated = dir.path().join("app.20240309");
        assert_eq!(fs::read_to_string(&dated).unwrap(), "one\n");
        assert_eq!(
            fs::read_link(dir.path().join("app.today")).unwrap(),
            PathBuf::from("app.20240309")
        );
        let mode = fs::metadata(&dated).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o660);
    }

    #[test]
    fn same_day_reuses_handle() {
        let dir = tempfile::tempdir().unwrap();
        let mut rotator = FileRotator::new(clock_at(9));
        rotator.retarget(dir.path().join("app")).unwrap();
        rotator.write("a\n").unwrap();
        rotator.write("b\n").unwrap();
        assert_eq!(rotator.open_count(), 1);
        rotator.close().unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("app.20240309")).unwrap(),
            "a\nb\n"
        );
    }

    #[test]
    fn day_boundary_rotates_once() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock_at(9);
        let mut rotator = FileRotator::new(clock.clone());
        rotator.retarget(dir.path().join("app")).unwrap();
        rotator.write("monday\n").unwrap();

        clock.advance(chrono::Duration::days(1));
        rotator.write("tuesday\n").unwrap();
        rotator.write("still tuesday\n").unwrap();
        assert_eq!(rotator.open_count(), 2);
        assert_eq!(rotator.date(), "20240310");
        rotator.close().unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("app.20240309")).unwrap(),
            "monday\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("app.20240310")).unwrap(),
            "tuesday\nstill tuesday\n"
        );
        assert_eq!(
            fs::read_link(dir.path().join("app.today")).unwrap(),
            PathBuf::from("app.20240310")
        );
    }

    #[test]
    fn rerotating_same_day_keeps_link_and_contents() {
        let dir = tempfile::tempdir().unwrap();
        let mut rotator = FileRotator::new(clock_at(9));
        rotator.retarget(dir.path().join("app")).unwrap();
        rotator.write("first\n").unwrap();
        rotator.rotate().unwrap();
        rotator.write("second\n").unwrap();
        rotator.close().unwrap();

        assert_eq!(
            fs::read_link(dir.path().join("app.today")).unwrap(),
            PathBuf::from("app.20240309")
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("app.20240309")).unwrap(),
            "first\nsecond\n"
        );
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with('.'))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn stale_link_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink("app.19990101", dir.path().join("app.today")).unwrap();
        let mut rotator = FileRotator::new(clock_at(9));
        rotator.retarget(dir.path().join("app")).unwrap();
        rotator.write("x\n").unwrap();
        assert_eq!(
            fs::read_link(dir.path().join("app.today")).unwrap(),
            PathBuf::from("app.20240309")
        );
    }

    #[test]
    fn blocked_link_still_writes_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let squatter = dir.path().join("app.today");
        fs::create_dir(&squatter).unwrap();
        fs::write(squatter.join("keep"), "occupied").unwrap();
        let mut rotator = FileRotator::new(clock_at(9));
        rotator.retarget(dir.path().join("app")).unwrap();

        assert!(matches!(rotator.write("hello\n"), Err(LogError::Io { .. })));
        assert!(rotator.is_open());
        rotator.write("again\n").unwrap();
        rotator.close().unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("app.20240309")).unwrap(),
            "hello\nagain\n"
        );
        assert!(squatter.is_dir());
    }

    #[test]
    fn unwritable_target_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let mut rotator = FileRotator::new(clock_at(9));
        rotator.retarget(blocker.join("app")).unwrap();
        assert!(matches!(rotator.write("x\n"), Err(LogError::Io { .. })));
        assert!(!rotator.is_open());
    }

    #[test]
    fn no_target_is_a_no_op() {
        let mut rotator = FileRotator::new(clock_at(9));
        rotator.write("ignored\n").unwrap();
        assert_eq!(rotator.open_count(), 0);
        assert!(rotator.dated_path().is_none());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Severity levels.
//!
//! Levels are plain integers in a fixed total order. Lower numbers are more urgent:
//! [`Level::EMERGENCY`] is `0` and [`Level::DEBUG7`] is `14`. A logger configured at level `L`
//! records every message whose level is numerically `<= L`.
//!
//! ```
//! use logstack::Level;
//!
//! assert!(Level::ERROR < Level::INFO);
//! assert_eq!("warn".parse::<Level>().unwrap(), Level::WARNING);
//! assert_eq!(Level::ERR, Level::ERROR);
//! ```

use crate::error::LogError;
use std::fmt::Display;
use std::str::FromStr;

/// An integer severity. Lower is more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u8);

impl Level {
    pub const EMERGENCY: Level = Level(0);
    pub const EMERG: Level = Level::EMERGENCY;
    pub const ALERT: Level = Level(1);
    pub const CRITICAL: Level = Level(2);
    pub const CRIT: Level = Level::CRITICAL;
    pub const ERROR: Level = Level(3);
    pub const ERR: Level = Level::ERROR;
    pub const WARNING: Level = Level(4);
    pub const WARN: Level = Level::WARNING;
    pub const NOTICE: Level = Level(5);
    pub const INFO: Level = Level(6);
    pub const DEBUG: Level = Level(7);
    pub const DEBUG1: Level = Level(8);
    /// Alias for [`Level::DEBUG1`].
    pub const TRACE: Level = Level::DEBUG1;
    pub const DEBUG2: Level = Level(9);
    pub const DEBUG3: Level = Level(10);
    pub const DEBUG4: Level = Level(11);
    pub const DEBUG5: Level = Level(12);
    pub const DEBUG6: Level = Level(13);
    pub const DEBUG7: Level = Level(14);

    /// Every accepted name, with the level it resolves to.
    const NAMES: &'static [(&'static str, Level)] = &[
        ("emerg", Level::EMERGENCY),
        ("emergency", Level::EMERGENCY),
        ("alert", Level::ALERT),
        ("crit", Level::CRITICAL),
        ("critical", Level::CRITICAL),
        ("err", Level::ERROR),
        ("error", Level::ERROR),
        ("warn", Level::WARNING),
        ("warning", Level::WARNING),
        ("notice", Level::NOTICE),
        ("info", Level::INFO),
        ("debug", Level::DEBUG),
        ("debug1", Level::DEBUG1),
        ("trace", Level::DEBUG1),
        ("debug2", Level::DEBUG2),
        ("debug3", Level::DEBUG3),
        ("debug4", Level::DEBUG4),
        ("debug5", Level::DEBUG5),
        ("debug6", Level::DEBUG6),
        ("debug7", Level::DEBUG7),
    ];

    /// Wraps a raw integer. Values past `DEBUG7` are accepted and simply rank as less urgent.
    pub const fn new(value: u8) -> Self {
        Level(value)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /**
    Looks up a level by name or alias, case-insensitively.

    Returns `None` for names that are not in the table; numbers are handled by [`FromStr`].
    */
    pub fn from_name(name: &str) -> Option<Level> {
        let name = name.trim();
        Self::NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, level)| *level)
    }

    /// Whether a logger configured at `self` records a message at `message`.
    #[inline]
    pub fn allows(self, message: Level) -> bool {
        self >= message
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::INFO
    }
}

impl From<u8> for Level {
    fn from(value: u8) -> Self {
        Level(value)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

/// Displays the numeric value, which is what the line prefix carries.
impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(level) = Level::from_name(s) {
            return Ok(level);
        }
        s.trim()
            .parse::<u8>()
            .map(Level)
            .map_err(|_| LogError::UnknownLevel(s.to_string()))
    }
}

/*
Boilerplate notes.

Copy/Clone/Eq/Ord/Hash all follow from being a small integer.
Default is INFO, which is what a fresh logger uses.
Display is the number, not the name, since several names share a number.
*/

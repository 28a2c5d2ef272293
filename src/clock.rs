// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock time for prefixes and rotation.
//!
//! Loggers read the time through a [`Clock`] so that day boundaries can be simulated.
//! [`SystemClock`] is the default; [`ManualClock`] only moves when told to.

use chrono::{DateTime, Local};
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The local system time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/**
A clock that stays put until set or advanced.

```
use logstack::{Clock, ManualClock};
use chrono::{Local, TimeZone};

let clock = ManualClock::new(Local.with_ymd_and_hms(2024, 2, 28, 23, 59, 0).unwrap());
clock.advance(chrono::Duration::minutes(2));
assert_eq!(clock.now().format("%Y%m%d").to_string(), "20240229");
```
*/
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        ManualClock {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

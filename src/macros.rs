// SPDX-License-Identifier: MIT OR Apache-2.0

//! Macros for building argument lists and the per-level convenience methods.

/**
Builds a `&[Arg]` from a list of values, converting each with `Arg::from`.

```
use logstack::{args, render, Arg, Level};

let retries = 3;
let list = args!["retrying ", retries, " times, last error: ", None::<&str>];
assert_eq!(render(Level::WARNING, list), "retrying [3] times, last error: [NULL]");

let empty: &[Arg] = args![];
assert!(empty.is_empty());
```
*/
#[macro_export]
macro_rules! args {
    () => {
        &[]
    };
    ($($arg:expr),+ $(,)?) => {
        &[$($crate::Arg::from($arg)),+]
    };
}

/**
Generates one method per level name, each forwarding to `self.log(level, args)`.
*/
macro_rules! level_methods {
    ($($name:ident => $level:ident),* $(,)?) => {
        $(
            #[doc = concat!("Logs `args` at [`Level::", stringify!($level), "`].")]
            #[inline]
            pub fn $name(&self, args: &[$crate::Arg<'_>]) {
                self.log($crate::Level::$level, args)
            }
        )*
    };
}

pub(crate) use level_methods;

/// Every level method, in severity order. Shared by `Logger` and `LoggerStack`.
macro_rules! all_level_methods {
    () => {
        $crate::macros::level_methods! {
            emerg => EMERGENCY,
            emergency => EMERGENCY,
            alert => ALERT,
            crit => CRITICAL,
            critical => CRITICAL,
            err => ERROR,
            error => ERROR,
            warn => WARNING,
            warning => WARNING,
            notice => NOTICE,
            info => INFO,
            debug => DEBUG,
            debug1 => DEBUG1,
            trace => DEBUG1,
            debug2 => DEBUG2,
            debug3 => DEBUG3,
            debug4 => DEBUG4,
            debug5 => DEBUG5,
            debug6 => DEBUG6,
            debug7 => DEBUG7,
        }
    };
}

pub(crate) use all_level_methods;

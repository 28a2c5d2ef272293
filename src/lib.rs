//SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# logstack

logstack is a leveled logging library for long-running processes that want to know *who* logged a
line, and want each day's output in its own file.

# The problem

A daemon writing to one ever-growing file is hard to operate. A daemon writing through a generic
logging facade usually loses the one piece of information that matters most when reading the log
at 3am: which object, in which method, said this.

logstack's answer:

* every line is prefixed with the time, the process id, the message level and the calling
  `Type::method()`;
* file output goes to `name.YYYYMMDD`, with a `name.today` symlink that always points at the live
  file;
* loggers live on a stack, so a request or job can redirect logging for its duration and restore
  the previous logger afterwards.

# Levels

Fifteen ordered levels, from [`Level::EMERGENCY`] (0) to [`Level::DEBUG7`] (14). Lower is more
severe. A logger configured at level `L` records messages whose level is `<= L`.

| Value | Names                     |
|-------|---------------------------|
| 0     | `EMERGENCY`, `EMERG`      |
| 1     | `ALERT`                   |
| 2     | `CRITICAL`, `CRIT`        |
| 3     | `ERROR`, `ERR`            |
| 4     | `WARNING`, `WARN`         |
| 5     | `NOTICE`                  |
| 6     | `INFO`                    |
| 7     | `DEBUG`                   |
| 8     | `DEBUG1`, `TRACE`         |
| 9-14  | `DEBUG2` .. `DEBUG7`      |

# The API

Messages are lists of heterogeneous values, built with [`args!`]:

```
use logstack::{args, Level, Logger, MemoryWriter};

let memory = MemoryWriter::new();
let logger = Logger::new(Some(Level::DEBUG), None);
logger.to_console_writer(memory.clone());

let user = "alice";
logger.info(args!["login by ", user, " after ", 3, " attempts"]);
assert!(memory.drain_logs().ends_with("login by alice after [3] attempts\n"));
```

Numbers, and text that looks like a number, are bracketed so that adjacent values stay readable.
See [`render`] for every rule.

# Files

```no_run
use logstack::{args, LogDirectory, Logger};
use std::sync::Arc;

let logger = Logger::new(None, Some(Arc::new(LogDirectory::new("/var/log/app"))));
logger.to_file("worker");
logger.notice(args!["started"]);
// /var/log/app/worker.20240309, with /var/log/app/worker.today -> worker.20240309
```

# Scoping

```
use logstack::{args, LoggerStack, MemoryWriter};

let stack = LoggerStack::new();
let memory = MemoryWriter::new();
stack.push(None).to_console_writer(memory.clone());
stack.warn(args!["inside the job"]);
stack.pop();
assert!(memory.drain_logs().contains("inside the job"));
```

Code that logs through the `log` crate can be routed into a stack with [`init_log_facade`].

# Multithreading

[`Logger`] and [`LoggerStack`] are `Send + Sync`. A single log call is written with one `write`
per destination under that destination's lock, so lines from concurrent callers do not
interleave.
*/

mod caller;
mod clock;
mod config;
mod console;
mod directory;
mod error;
mod facade;
mod format;
mod level;
mod logger;
mod macros;
mod memory;
mod rotation;
mod stack;

pub use caller::{CallerResolver, Frame, LogPrefix, PrefixScope, SkipSet, prefix_scope};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CONSOLE_VAR, FILE_VAR, LEVEL_VAR, LoggerConfig};
pub use console::Console;
pub use directory::{Directory, LogDirectory};
pub use error::{LogError, Result};
pub use facade::{StackFacade, init_log_facade};
pub use format::{
    Arg, CaughtError, ErrorValue, LogString, SourceLocation, is_numeric, render,
};
pub use level::Level;
pub use logger::{Logger, assemble_lines};
pub use memory::MemoryWriter;
pub use rotation::FileRotator;
pub use stack::{FALLBACK_FILE, LoggerStack, global_stack};
